mod client;
mod view;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::client::DocshelfClient;
use crate::view::{read_pdf_data_url, render_table, View};

#[derive(Debug, Parser)]
#[command(name = "docshelf-cli", version, about = "Browse, upload and delete documents on a Docshelf server")]
struct Cli {
    /// Base URL of the Docshelf server.
    #[arg(long, env = "DOCSHELF_URL", default_value = "http://localhost:3000", global = true)]
    server: String,

    /// Admin password, needed for upload and delete.
    #[arg(long, env = "DOCSHELF_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List documents, optionally filtered by title.
    List {
        /// Case-insensitive substring to look for in titles.
        #[arg(short, long, default_value = "")]
        search: String,

        /// Print the listing as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Check the admin password.
    Login,
    /// Upload a PDF.
    Upload {
        #[arg(long)]
        title: String,

        /// Age restriction label, e.g. 18+.
        #[arg(long = "age")]
        age_restriction: String,

        file: PathBuf,
    },
    /// Delete a document by id.
    Delete {
        id: u64,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Download a document by id.
    Download {
        id: u64,

        /// Destination path; defaults to `<title>.pdf` in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DocshelfClient::new(&cli.server)?;

    match cli.command {
        Command::List { search, json } => {
            let mut view = View::new(search);
            view.refresh(&client).await?;
            let visible = view.visible();

            if json {
                let values: Vec<serde_json::Value> = visible
                    .iter()
                    .map(|d| {
                        let file_url = client
                            .resolve(&d.file_url)
                            .map(|u| u.to_string())
                            .unwrap_or_else(|_| d.file_url.clone());
                        serde_json::json!({
                            "id": d.id,
                            "title": d.title,
                            "ageRestriction": d.age_restriction,
                            "fileUrl": file_url,
                            "uploadDate": d.upload_date,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                print!("{}", render_table(&visible));
            }
        }
        Command::Login => {
            let mut view = View::default();
            view.unlock(&client, cli.password.as_deref()).await?;
            println!("Password accepted.");
        }
        Command::Upload {
            title,
            age_restriction,
            file,
        } => {
            let mut view = View::default();
            view.unlock(&client, cli.password.as_deref()).await?;

            let file_data = read_pdf_data_url(&file).await?;
            let uploaded = view
                .upload(&client, &title, &age_restriction, &file_data)
                .await?;
            println!("Uploaded: {}", client.resolve(&uploaded.url)?);
            print!("{}", render_table(&view.visible()));
        }
        Command::Delete { id, yes } => {
            let mut view = View::default();
            view.unlock(&client, cli.password.as_deref()).await?;

            if !yes {
                view.refresh(&client).await?;
                let title = view.find(id).map(|doc| doc.title.as_str());
                let stdin = std::io::stdin();
                if !confirm(&delete_prompt(id, title), stdin.lock(), std::io::stdout())? {
                    println!("Delete cancelled.");
                    return Ok(());
                }
            }

            let response = view.delete(&client, id).await?;
            if response.success && response.deleted {
                println!("Deleted document {id}.");
            } else {
                println!("No document with id {id}.");
            }
            print!("{}", render_table(&view.visible()));
        }
        Command::Download { id, output } => {
            let mut view = View::default();
            view.refresh(&client).await?;
            let doc = view
                .find(id)
                .with_context(|| format!("No document with id {id}"))?;

            let output = output.unwrap_or_else(|| PathBuf::from(download_file_name(&doc.title)));
            let content = client.download(&doc.file_url).await?;
            tokio::fs::write(&output, &content)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} ({} bytes).", output.display(), content.len());
        }
    }

    Ok(())
}

fn delete_prompt(id: u64, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("Delete document {id} \"{title}\"? (y/n): "),
        None => format!("Delete document {id}? (y/n): "),
    }
}

/// Ask a yes/no question; anything but `y` or `yes` is a no.
fn confirm(prompt: &str, mut input: impl BufRead, mut output: impl Write) -> Result<bool> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut response = String::new();
    input
        .read_line(&mut response)
        .context("Failed to read confirmation")?;
    let response = response.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// File name for a downloaded document, with path separators replaced.
fn download_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("{}.pdf", stem.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name("Book A"), "Book A.pdf");
        assert_eq!(download_file_name("a/b\\c"), "a_b_c.pdf");
    }

    #[test]
    fn test_confirm_accepts_only_yes() {
        for (answer, expected) in [
            ("y\n", true),
            ("YES\n", true),
            (" yes \n", true),
            ("n\n", false),
            ("\n", false),
            ("", false),
            ("yep\n", false),
        ] {
            let mut output = Vec::new();
            let confirmed = confirm("Delete? ", answer.as_bytes(), &mut output).unwrap();
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(output, b"Delete? ");
        }
    }

    #[test]
    fn test_delete_prompt_names_the_document() {
        assert_eq!(
            delete_prompt(7, Some("Book A")),
            "Delete document 7 \"Book A\"? (y/n): "
        );
        assert_eq!(delete_prompt(7, None), "Delete document 7? (y/n): ");
    }

    #[test]
    fn test_cli_parses_delete_flags() {
        let cli = Cli::try_parse_from(["docshelf-cli", "delete", "7"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { id: 7, yes: false }));

        let cli = Cli::try_parse_from(["docshelf-cli", "delete", "7", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::Delete { id: 7, yes: true }));
    }

    #[test]
    fn test_cli_parses_upload() {
        let cli = Cli::try_parse_from([
            "docshelf-cli",
            "--password",
            "secret",
            "upload",
            "--title",
            "Book A",
            "--age",
            "18+",
            "book.pdf",
        ])
        .unwrap();

        assert_eq!(cli.password.as_deref(), Some("secret"));
        match cli.command {
            Command::Upload {
                title,
                age_restriction,
                file,
            } => {
                assert_eq!(title, "Book A");
                assert_eq!(age_restriction, "18+");
                assert_eq!(file, PathBuf::from("book.pdf"));
            }
            other => panic!("Expected Upload, got: {:?}", other),
        }
    }
}
