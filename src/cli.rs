use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipkit")]
#[command(version)]
#[command(about = "Read and extract ZIP archives from files or HTTP URLs", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipkit data1.zip -x joe        extract all files except joe from data1.zip\n  \
  zipkit -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  zipkit -l https://example.com/archive.zip   list files from remote ZIP\n  \
  zipkit --caps                  print the platform capability table")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE", required_unless_present = "caps")]
    pub file: Option<String>,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print the resolved platform capability table and exit
    #[arg(long = "caps")]
    pub caps: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(|f| f.starts_with("http://") || f.starts_with("https://"))
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
