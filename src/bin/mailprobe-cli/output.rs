use std::fmt::Write as _;

use anyhow::{Context, Result, bail};

use mailprobe_lib::{FindReport, GuessSet, VerificationVerdict};

use crate::args::Cli;

#[cfg(feature = "with-csv")]
const CSV_HEADER: [&str; 6] = ["address", "outcome", "confidence", "method", "reason", "mx_host"];

pub fn write_find(report: &FindReport, cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => write_human(&find_human(report), cli),
        "json" => write_json(report, cli),
        "ndjson" => write_ndjson(find_rows(report), cli),
        "csv" => write_csv(find_rows(report), cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn write_verdicts(rows: &[VerificationVerdict], cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => {
            let mut text = String::new();
            for row in rows {
                let _ = writeln!(text, "{}", human_line(row));
            }
            write_human(&text, cli)
        }
        "json" => write_json(rows, cli),
        "ndjson" => write_ndjson(rows, cli),
        "csv" => write_csv(rows, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn write_guesses(guesses: &GuessSet, cli: &Cli) -> Result<()> {
    let addresses = guesses.addresses();
    match cli.format.as_str() {
        "human" => {
            let mut text = String::new();
            for (rank, address) in addresses.iter().enumerate() {
                let _ = writeln!(text, "{:>3}. {address}", rank + 1);
            }
            write_human(&text, cli)
        }
        "json" => write_json(addresses.as_slice(), cli),
        "ndjson" => write_ndjson(addresses.as_slice(), cli),
        "csv" => write_guesses_csv(&addresses, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

fn find_rows(report: &FindReport) -> &[VerificationVerdict] {
    match report {
        FindReport::Found { verdict, .. } => std::slice::from_ref(verdict),
        FindReport::NotFound { attempts, .. } => attempts,
        FindReport::InsufficientName | FindReport::NoUsablePattern { .. } => &[],
    }
}

fn find_human(report: &FindReport) -> String {
    let mut text = String::new();
    match report {
        FindReport::Found {
            verdict,
            checked,
            total,
        } => {
            let _ = writeln!(text, "[FOUND] {} ({checked}/{total} checked)", verdict.address);
            let _ = writeln!(text, "        {}", human_line(verdict));
        }
        FindReport::InsufficientName => {
            let _ = writeln!(text, "[NONE] name must contain at least a first and last name");
        }
        FindReport::NoUsablePattern { tokens } => {
            let _ = writeln!(
                text,
                "[NONE] none of the {tokens} name tokens spells a valid local part"
            );
        }
        FindReport::NotFound {
            attempts,
            suggestions,
            total,
        } => {
            let _ = writeln!(text, "[NONE] no valid email found among {total} patterns");
            for attempt in attempts {
                let _ = writeln!(text, "        {}", human_line(attempt));
            }
            for suggestion in suggestions {
                let _ = writeln!(text, "  hint: {suggestion}");
            }
        }
    }
    text
}

/// `--out` vaut aussi pour le format texte
fn write_human(text: &str, cli: &Cli) -> Result<()> {
    match &cli.out {
        Some(path) => write_all_atomically(path, text.as_bytes()),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn human_line(verdict: &VerificationVerdict) -> String {
    let mut line = format!(
        "{:<40} {:<12} {:>3}% via {}",
        verdict.address,
        verdict.outcome.to_string(),
        verdict.confidence,
        verdict.method
    );
    if let Some(host) = &verdict.mx_host {
        line.push_str(&format!(" [{host}]"));
    }
    if let Some(reason) = &verdict.reason {
        line.push_str(&format!(" :: {reason}"));
    }
    line
}

#[cfg(feature = "with-serde")]
fn write_json<T: serde::Serialize + ?Sized>(value: &T, cli: &Cli) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    if let Some(path) = &cli.out {
        write_all_atomically(path, s.as_bytes())?;
    } else {
        println!("{s}");
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json<T: ?Sized>(_: &T, _: &Cli) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson<T: serde::Serialize>(rows: &[T], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        for row in rows {
            let line = serde_json::to_string(row)?;
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        write_all_atomically(path, &buf)?;
    } else {
        for row in rows {
            println!("{}", serde_json::to_string(row)?);
        }
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson<T>(_: &[T], _: &Cli) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv(rows: &[VerificationVerdict], cli: &Cli) -> Result<()> {
    let records = rows.iter().map(csv_record);
    write_csv_records(&CSV_HEADER, records, cli)
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[VerificationVerdict], _: &Cli) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(feature = "with-csv")]
fn write_guesses_csv(addresses: &[String], cli: &Cli) -> Result<()> {
    let records = addresses
        .iter()
        .enumerate()
        .map(|(rank, address)| vec![(rank + 1).to_string(), address.clone()]);
    write_csv_records(&["rank", "address"], records, cli)
}

#[cfg(not(feature = "with-csv"))]
fn write_guesses_csv(_: &[String], _: &Cli) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(feature = "with-csv")]
fn write_csv_records<I>(header: &[&str], records: I, cli: &Cli) -> Result<()>
where
    I: Iterator<Item = Vec<String>>,
{
    if let Some(path) = &cli.out {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(header)?;
        for record in records {
            wtr.write_record(&record)?;
        }
        let data = wtr.into_inner()?;
        write_all_atomically(path, &data)?;
    } else {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        wtr.write_record(header)?;
        for record in records {
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
    }
    Ok(())
}

#[cfg(feature = "with-csv")]
fn csv_record(verdict: &VerificationVerdict) -> Vec<String> {
    vec![
        verdict.address.clone(),
        verdict.outcome.to_string(),
        verdict.confidence.to_string(),
        verdict.method.to_string(),
        verdict.reason.clone().unwrap_or_default(),
        verdict.mx_host.clone().unwrap_or_default(),
    ]
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}
