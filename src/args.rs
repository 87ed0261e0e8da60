use clap::{Arg, ArgAction, Command};
use qrsculpt::{ECLevel, MaskPattern, Version};

pub fn parse_args() -> clap::ArgMatches {
    Command::new("qrsculpt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates QR codes, optionally shaped to look like an image")
        .arg(Arg::new("content").help("Text to encode").required(true))
        .arg(
            Arg::new("ec")
                .long("ec")
                .help("Error correction level: L, M, Q or H")
                .default_value("L")
                .value_parser(|s: &str| s.parse::<ECLevel>().map_err(|e| e.to_string())),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Symbol version 1-40, smallest fit if omitted")
                .value_parser(|s: &str| {
                    let v = s.parse::<usize>().map_err(|e| e.to_string())?;
                    Version::new(v).map_err(|e| e.to_string())
                }),
        )
        .arg(Arg::new("charset").long("charset").help("Byte mode charset label, e.g. utf-8"))
        .arg(
            Arg::new("mask")
                .long("mask")
                .help("Mask pattern 0-7, lowest penalty if omitted")
                .value_parser(|s: &str| {
                    let m = s.parse::<u8>().map_err(|e| e.to_string())?;
                    MaskPattern::new(m).map_err(|e| e.to_string())
                }),
        )
        .arg(
            Arg::new("margin")
                .long("margin")
                .help("Quiet zone in modules")
                .default_value("4")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("module_size")
                .long("module-size")
                .help("Pixels per module")
                .default_value("8")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(Arg::new("embed").long("embed").help("Image the symbol should resemble"))
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("PNG file to write, prints to the terminal if omitted"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log pipeline details")
                .action(ArgAction::SetTrue),
        )
        .disable_version_flag(true)
        .get_matches()
}
