use crate::cli::{Command, DocCommand, Target};
use anyhow::{Context, bail};
use chrono::{DateTime, SecondsFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use strata::Strata;
use strata::audit::AuditRecord;
use strata::document::{DocumentTree, Template};
use strata::domain::format::OutputFormat;
use strata::domain::model::WriteOutcome;
use strata::storage::KvBackend;

/// Runs one command against `strata`, printing results to `out`.
///
/// `format` is used wherever the command line names none.
pub(crate) async fn execute<B: KvBackend>(
    strata: &Strata<B>,
    command: Command,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Doc { command } => document(strata, command, format, out).await,
        Command::Import { name, path, author } => {
            let template = Template::from_path(&path)
                .with_context(|| format!("Failed to load template {}", path.display()))?;
            let (keys, outcomes) = strata.import(&name, &template, &author).await?;
            writeln!(out, "Imported {name}: {} keys, {} values seeded", keys.len(), outcomes.len())?;
            Ok(())
        },
        Command::Put { target, key, value, author, force } => {
            let region = strata.region(&target.document, &target.region)?;
            match region.write(&key, &value, &author, force).await? {
                WriteOutcome::Changed { revision } => writeln!(out, "{key}: revision {revision}")?,
                WriteOutcome::Unchanged => writeln!(out, "{key}: unchanged")?,
            }
            Ok(())
        },
        Command::Get { target, key } => {
            let value = strata.region(&target.document, &target.region)?.read(&key).await?;
            writeln!(out, "{value}")?;
            Ok(())
        },
        Command::Tree { target, key, format: chosen } => {
            let key = key.unwrap_or_default();
            let values = strata.region(&target.document, &target.region)?.read_subtree(&key).await?;
            if values.is_empty() && !key.is_empty() {
                bail!("No values below '{key}' in {}/{}", target.document, target.region);
            }
            let tree = DocumentTree::build(values)?;
            tree.emit(chosen.unwrap_or(format), out)?;
            Ok(())
        },
        Command::Generate { target, format: chosen, output } => {
            let format = chosen.unwrap_or(format);
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut sink = BufWriter::new(file);
                    strata.generate(&target.document, &target.region, format, &mut sink).await?;
                    sink.flush()?;
                    writeln!(out, "Wrote {}", path.display())?;
                },
                None => strata.generate(&target.document, &target.region, format, out).await?,
            }
            Ok(())
        },
        Command::Audit { target, key, author } => {
            let key = key.unwrap_or_default();
            let records =
                strata.history(&target.document, &target.region, &key, author.as_deref()).await?;
            for record in &records {
                print_record(out, record)?;
            }
            Ok(())
        },
        Command::Destroy { target: Target { document, region } } => {
            strata.region(&document, &region)?.destroy_region().await?;
            writeln!(out, "Destroyed {document}/{region}")?;
            Ok(())
        },
    }
}

async fn document<B: KvBackend>(
    strata: &Strata<B>,
    command: DocCommand,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let registry = strata.documents();
    match command {
        DocCommand::Create { name, source, format: chosen } => {
            let keys = if source == "-" {
                registry.create_from_reader(&name, io::stdin().lock(), chosen.unwrap_or(format)).await?
            } else {
                registry.create_from_path(&name, &source).await?
            };
            writeln!(out, "Created {name} with {} keys", keys.len())?;
        },
        DocCommand::Show { name } => {
            let keys = registry.get(&name).await?;
            out.write_all(keys.serialize().as_bytes())?;
        },
        DocCommand::List => {
            for name in registry.list().await? {
                writeln!(out, "{name}")?;
            }
        },
    }
    Ok(())
}

fn print_record(out: &mut impl Write, record: &AuditRecord) -> io::Result<()> {
    let when = DateTime::from_timestamp_millis(record.timestamp).map_or_else(
        || record.timestamp.to_string(),
        |at| at.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    writeln!(
        out,
        "{when}  {}  {}#{}  {} -> {}",
        record.author, record.key, record.revision, record.old_value, record.new_value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;
    use strata::storage::MemoryBackend;
    use tempfile::TempDir;

    async fn run(strata: &Strata<MemoryBackend>, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("strata").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(strata, cli.command, OutputFormat::Yaml, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    async fn imported(tmp: &TempDir) -> Strata<MemoryBackend> {
        let path = tmp.path().join("app.yaml");
        fs::write(&path, "server:\n  host: \"localhost\"\n  port: 8080\n").unwrap();

        let strata = Strata::new(MemoryBackend::new());
        let printed = run(&strata, &["import", "app", path.to_str().unwrap(), "-a", "ops"]).await.unwrap();
        assert_eq!(printed, "Imported app: 3 keys, 2 values seeded\n");
        strata
    }

    #[tokio::test]
    async fn test_put_get_and_generate() {
        let tmp = TempDir::new().unwrap();
        let strata = imported(&tmp).await;

        assert_eq!(run(&strata, &["put", "app", "eu", "server/port", "9090", "-a", "ops"]).await.unwrap(), "server/port: revision 1\n");
        assert_eq!(run(&strata, &["put", "app", "eu", "server/port", "9090", "-a", "ops"]).await.unwrap(), "server/port: unchanged\n");
        assert_eq!(run(&strata, &["get", "app", "eu", "server/port"]).await.unwrap(), "9090\n");
        assert_eq!(run(&strata, &["get", "app", "us", "server/port"]).await.unwrap(), "8080\n");

        assert!(run(&strata, &["put", "app", "eu", "server/host", "example.com", "-a", "ops"]).await.is_err());

        let yaml = run(&strata, &["generate", "app", "eu"]).await.unwrap();
        assert_eq!(yaml, "server:\n  host: \"localhost\"\n  port: 9090\n");

        let json = run(&strata, &["tree", "app", "eu", "server/port", "-f", "json"]).await.unwrap();
        assert_eq!(json, "{\n  \"server\": {\n    \"port\": 9090\n  }\n}\n");
        assert!(run(&strata, &["tree", "app", "eu", "nothing"]).await.is_err());
    }

    #[tokio::test]
    async fn test_documents_audit_and_destroy() {
        let tmp = TempDir::new().unwrap();
        let strata = imported(&tmp).await;

        assert_eq!(run(&strata, &["doc", "list"]).await.unwrap(), "app\n");
        assert_eq!(run(&strata, &["doc", "show", "app"]).await.unwrap(), "server\nserver/host\nserver/port\n");
        assert!(run(&strata, &["doc", "show", "missing"]).await.is_err());

        run(&strata, &["put", "app", "eu", "server/port", "1", "-a", "ops"]).await.unwrap();
        run(&strata, &["put", "app", "eu", "server/port", "2", "-a", "dev"]).await.unwrap();
        let audit = run(&strata, &["audit", "app", "eu", "-a", "DEV"]).await.unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.ends_with("dev  server/port#2  1 -> 2\n"), "{audit}");

        assert_eq!(run(&strata, &["destroy", "app", "eu"]).await.unwrap(), "Destroyed app/eu\n");
        assert_eq!(run(&strata, &["audit", "app", "eu"]).await.unwrap(), "");
        assert_eq!(run(&strata, &["get", "app", "eu", "server/port"]).await.unwrap(), "8080\n");
    }

    #[tokio::test]
    async fn test_generate_to_file() {
        let tmp = TempDir::new().unwrap();
        let strata = imported(&tmp).await;
        let target = tmp.path().join("out.json");

        run(&strata, &["generate", "app", "default", "-f", "json", "-o", target.to_str().unwrap()]).await.unwrap();
        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains("\"host\": \"localhost\""));
    }
}
