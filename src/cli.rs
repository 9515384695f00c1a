use crate::target::DEFAULT_EXTENSION;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sbscript-rs",
    about = "Convert Scratch 3 projects into .scs script text, one file per sprite."
)]
pub struct Args {
    #[arg(
        value_name = "INPUT",
        help = "An .sb3 archive, a project.json file, or a directory holding an extracted project."
    )]
    pub input: PathBuf,

    #[arg(
        value_name = "OUTPUT",
        help = "Directory for the generated scripts (default: <input>_scs next to the input)."
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Unpack the .sb3 archive into DIR before converting.")]
    pub extract: Option<PathBuf>,

    #[arg(long, help = "Stop after unpacking the archive (requires --extract).")]
    pub extract_only: bool,

    #[arg(long, help = "Skip targets that fail to convert instead of aborting.")]
    pub keep_going: bool,

    #[arg(long, default_value = DEFAULT_EXTENSION, help = "File extension of generated scripts.")]
    pub extension: String,

    #[arg(short, long, help = "Log every written file.")]
    pub verbose: bool,
}
