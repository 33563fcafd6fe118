//! Main entry point for the zipkit CLI.
//!
//! Lists and extracts ZIP archives from the local filesystem or remote
//! HTTP URLs, and can print the build's platform capability table.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zipkit::config::{PACKAGE, VERSION};
use zipkit::{Cli, FileSource, HttpRangeSource, ReadAt, ZipArchive, ZipFileEntry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.caps {
        print_capabilities();
        return Ok(());
    }

    let Some(file) = cli.file.clone() else {
        bail!("No archive given");
    };

    if cli.is_http_url() {
        // Remote archive via HTTP Range requests.
        let source = HttpRangeSource::connect(file).await?;
        let transferred_before = source.transferred_bytes();
        let source = Arc::new(source);

        process_zip(source.clone(), &cli).await?;

        if !cli.is_quiet() {
            let transferred = source.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let source = Arc::new(FileSource::open(Path::new(&file))?);
        process_zip(source, &cli).await?;
    }

    Ok(())
}

/// Print the resolved capability table for this build, in the shape of the
/// generated libzip configuration header.
fn print_capabilities() {
    let caps = zipkit::capabilities();
    println!("{PACKAGE} {VERSION} ({} branch)", caps.platform());
    print!("{}", caps.render());
}

/// Process a ZIP archive based on CLI options: list mode prints the
/// contents, extract mode writes the files matching the CLI filters.
async fn process_zip<R: ReadAt + 'static>(source: Arc<R>, cli: &Cli) -> Result<()> {
    let archive = ZipArchive::from_source(source);

    if cli.list || cli.verbose {
        return list_files(&archive, cli.verbose).await;
    }

    let entries = archive.entries().await?;

    // Filter to the files to extract: skip directories, honor positional
    // name/glob selectors, drop exclusions.
    let files_to_extract: Vec<_> = entries
        .iter()
        .filter(|e| {
            if e.is_directory {
                return false;
            }

            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &e.file_name)
                    } else {
                        // No wildcards: exact match on filename or full path
                        let basename = Path::new(&e.file_name)
                            .file_name()
                            .map(|s| s.to_string_lossy())
                            .unwrap_or_default();
                        e.file_name == *f || basename == *f
                    }
                });
                if !matches {
                    return false;
                }
            }

            if cli
                .exclude
                .iter()
                .any(|x| e.file_name.contains(x) || glob_match(x, &e.file_name))
            {
                return false;
            }

            true
        })
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for entry in files_to_extract {
        extract_file(&archive, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// List files in the ZIP archive.
///
/// Short format prints one name per line; verbose format prints a table
/// with sizes, compression ratios and timestamps, followed by totals and
/// the archive comment if one is set.
async fn list_files<R: ReadAt + 'static>(archive: &ZipArchive<R>, verbose: bool) -> Result<()> {
    let entries = archive.entries().await?;

    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if verbose {
            let (year, month, day) = entry.mod_date();
            let (hour, minute, _second) = entry.mod_time();

            let ratio = compression_ratio(entry.uncompressed_size, entry.compressed_size);

            println!(
                "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                entry.uncompressed_size,
                entry.compressed_size,
                ratio,
                year,
                month,
                day,
                hour,
                minute,
                entry.file_name
            );

            if !entry.is_directory {
                total_uncompressed += entry.uncompressed_size;
                total_compressed += entry.compressed_size;
                file_count += 1;
            }
        } else {
            println!("{}", entry.file_name);
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        let total_ratio = compression_ratio(total_uncompressed, total_compressed);
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed, total_compressed, total_ratio, "", file_count
        );

        if let Some(comment) = archive.comment().await? {
            println!("Archive comment: {comment}");
        }
    }

    Ok(())
}

/// Extract a single file from the archive, honoring pipe mode, the output
/// directory, junked paths and the overwrite policy.
async fn extract_file<R: ReadAt + 'static>(
    archive: &ZipArchive<R>,
    entry: &ZipFileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.file_name).as_bytes())
                .await?;
        }
        return archive.extract_to_stdout(entry).await;
    }

    let file_name = if cli.junk_paths {
        // Junk paths: only the base filename, no directories.
        Path::new(&entry.file_name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| entry.file_name.clone())
    } else {
        entry.file_name.clone()
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&file_name),
        None => PathBuf::from(&file_name),
    };

    if output_path.exists() {
        if cli.never_overwrite {
            // -n flag: never overwrite, skip silently (unless quiet)
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.file_name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.file_name);
            }
            return Ok(());
        }
        // -o flag: overwrite without prompting.
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    archive.extract_entry(entry, &output_path).await?;

    Ok(())
}

/// Percentage saved by compression, clamped at zero for entries whose
/// compressed form grew (normal for tiny or incompressible data).
fn compression_ratio(uncompressed: u64, compressed: u64) -> String {
    if uncompressed > 0 {
        format!(
            "{:>4}%",
            100u64.saturating_sub(compressed * 100 / uncompressed)
        )
    } else {
        "  0%".to_string()
    }
}

/// Whether a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob matching supporting `*` and `?` wildcards.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    // Backtracking matcher: `*` tries zero characters first, then one.
    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matching() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("docs/*", "docs/a/b.md"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(has_glob_chars("*.txt"));
        assert!(!has_glob_chars("readme.txt"));
    }

    #[test]
    fn ratio_clamps_expanding_entries() {
        assert_eq!(compression_ratio(100, 40), "  60%");
        // A 1-byte file whose deflate stream grew to 3 bytes must not
        // underflow; it simply saved nothing.
        assert_eq!(compression_ratio(1, 3), "   0%");
        assert_eq!(compression_ratio(0, 0), "  0%");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
