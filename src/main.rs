mod args;

use anyhow::{bail, Context, Result};
use log::{info, LevelFilter};

use args::parse_args;
use qrsculpt::{Charset, ECLevel, MaskPattern, QRBuilder, Target, Version};

fn main() -> Result<()> {
    let matches = parse_args();

    let mut logger = env_logger::Builder::from_default_env();
    logger.format_timestamp(None).format_module_path(false).format_target(false);
    if matches.get_flag("verbose") {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let content = matches.get_one::<String>("content").context("Missing content")?;
    let module_sz = *matches.get_one::<u32>("module_size").context("Missing module size")?;

    let mut builder = QRBuilder::new(content);
    builder
        .ec_level(*matches.get_one::<ECLevel>("ec").context("Missing EC level")?)
        .margin(*matches.get_one::<usize>("margin").context("Missing margin")?);
    if let Some(&ver) = matches.get_one::<Version>("version") {
        builder.version(ver);
    }
    if let Some(&mask) = matches.get_one::<MaskPattern>("mask") {
        builder.mask(mask);
    }
    if let Some(label) = matches.get_one::<String>("charset") {
        builder.charset(Charset::from_label(label)?);
    }

    let output = matches.get_one::<String>("output");
    match matches.get_one::<String>("embed") {
        Some(path) => {
            let Some(output) = output else {
                bail!("--embed needs --output to write the image");
            };
            let img = image::open(path).with_context(|| format!("Failed to open {path}"))?;
            let ver = builder.plan()?.version();
            let target = Target::from_image(&img, ver, module_sz)?;
            let qr = builder.beautify(&target)?;
            qr.render_with_background(&img.to_rgb8(), &target, module_sz)?
                .save(output)
                .with_context(|| format!("Failed to write {output}"))?;
            info!("Wrote {output}");
        }
        None => {
            let qr = builder.build()?;
            match output {
                Some(output) => {
                    qr.render(module_sz)
                        .save(output)
                        .with_context(|| format!("Failed to write {output}"))?;
                    info!("Wrote {output}");
                }
                None => println!("{}", qr.to_str(1)),
            }
        }
    }

    Ok(())
}
