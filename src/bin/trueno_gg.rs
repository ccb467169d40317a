//! trueno-gg - plot a CSV file from the command line.
//!
//! ```text
//! trueno-gg data.csv --aes x=a --aes y=b --geom point \
//!     --scale y_log10 limits=1,100 --facet wrap var=g --output out.png
//! ```
//!
//! Every `--geom` adds a layer. The n-th `--stat` replaces the statistic
//! of the n-th layer. Parameters are `key=value` words after the name.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use trueno_gg::data::{read_csv, DataFrame, DataValue};
use trueno_gg::grammar::aes::normalize_aesthetic;
use trueno_gg::grammar::{ggplot, labs, Aes, Facet, GGPlot, Geom, Stat, Theme};
use trueno_gg::options::{set_options, PlotOptions};
use trueno_gg::output::{SaveOptions, Units};
use trueno_gg::scale::Scale;

/// trueno-gg: grammar of graphics plots from CSV data
#[derive(Parser, Debug)]
#[command(name = "trueno-gg")]
#[command(author = "PAIML Team")]
#[command(version)]
#[command(about = "Layered grammar of graphics plots from CSV data", long_about = None)]
struct Cli {
    /// CSV file with a header row; `-` reads standard input
    data: PathBuf,

    /// Aesthetic mapping `aesthetic=expression`, e.g. `x=a` or `y=log10(b)`
    #[arg(long = "aes", value_name = "AES=EXPR")]
    aes: Vec<String>,

    /// Layer: geometry name followed by `key=value` settings
    #[arg(long, num_args = 1.., action = ArgAction::Append, value_name = "NAME [K=V]...")]
    geom: Vec<Vec<String>>,

    /// Statistic of the matching layer, with `key=value` parameters
    #[arg(long, num_args = 1.., action = ArgAction::Append, value_name = "NAME [K=V]...")]
    stat: Vec<Vec<String>>,

    /// Scale by registry name (`x_log10`, `color_gradient`, ...) with options
    #[arg(long, num_args = 1.., action = ArgAction::Append, value_name = "NAME [K=V]...")]
    scale: Vec<Vec<String>>,

    /// Facet (`wrap` or `grid`) with `key=value` options
    #[arg(long, num_args = 1.., value_name = "NAME [K=V]...")]
    facet: Option<Vec<String>>,

    /// Theme preset
    #[arg(long)]
    theme: Option<String>,

    /// Plot title
    #[arg(long)]
    title: Option<String>,

    /// Output file; the extension picks PNG or SVG
    #[arg(short, long, default_value = "plot.png")]
    output: PathBuf,

    /// Figure width in `--units`
    #[arg(long)]
    width: Option<f64>,

    /// Figure height in `--units`
    #[arg(long)]
    height: Option<f64>,

    /// Unit of width and height: in, cm, mm or px
    #[arg(long, default_value = "in")]
    units: String,

    /// Resolution in dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// Allow figures larger than the size ceiling
    #[arg(long)]
    no_limitsize: bool,

    /// Options file (YAML); defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let opts = match &cli.config {
        Some(path) => PlotOptions::load(path).with_context(|| format!("loading options from {}", path.display()))?,
        None => PlotOptions::load_or_default(None),
    };
    set_options(opts);

    let data = load_data(&cli)?;
    let plot = compose(&cli, data)?;
    let mut save = SaveOptions::new().limitsize(!cli.no_limitsize);
    save.units = Units::from_name(&cli.units)?;
    save.width = cli.width;
    save.height = cli.height;
    save.dpi = cli.dpi;
    plot.save(&cli.output, &save)
        .with_context(|| format!("saving {}", cli.output.display()))?;
    tracing::info!(layers = plot.layers().len(), "done");
    println!("wrote {}", cli.output.display());
    Ok(())
}

fn load_data(cli: &Cli) -> Result<DataFrame> {
    if cli.data.as_os_str() == "-" {
        return Ok(read_csv(io::stdin().lock())?);
    }
    let file = File::open(&cli.data).with_context(|| format!("opening {}", cli.data.display()))?;
    read_csv(BufReader::new(file)).with_context(|| format!("reading {}", cli.data.display()))
}

/// Assemble the plot from the parsed arguments.
fn compose(cli: &Cli, data: DataFrame) -> Result<GGPlot> {
    let mut mapping = Aes::new();
    for entry in &cli.aes {
        let (aesthetic, expr) = split_pair(entry)?;
        mapping = mapping.set(aesthetic, expr);
    }
    let mut plot = ggplot(Some(data), mapping);

    if cli.stat.len() > cli.geom.len() {
        bail!("{} --stat given for {} --geom layers", cli.stat.len(), cli.geom.len());
    }
    for (i, words) in cli.geom.iter().enumerate() {
        let (name, params) = name_and_params(words)?;
        let mut geom = Geom::from_name(name)?;
        if let Some(stat_words) = cli.stat.get(i) {
            let (stat_name, stat_params) = name_and_params(stat_words)?;
            let mut stat = Stat::from_name(stat_name)?;
            for (key, value) in stat_params {
                stat = stat.param(&key, value)?;
            }
            geom = geom.stat(stat);
        }
        let aesthetics = geom.kind().aesthetics();
        for (key, value) in params {
            geom = if aesthetics.contains(&normalize_aesthetic(&key).as_str()) {
                geom.set(&key, value)?
            } else {
                geom.param(&key, value)?
            };
        }
        plot += geom;
    }

    for words in &cli.scale {
        let (name, params) = name_and_params(words)?;
        let mut scale = Scale::from_name(name)?;
        for (key, value) in &params {
            scale.set_param(key, value)?;
        }
        plot += scale;
    }
    if let Some(words) = &cli.facet {
        let (name, params) = name_and_params(words)?;
        plot += Facet::from_name(name, &params)?;
    }
    if let Some(name) = &cli.theme {
        plot += Theme::from_name(name)?;
    }
    if let Some(title) = &cli.title {
        plot += labs().title(title.as_str());
    }
    Ok(plot)
}

fn split_pair(word: &str) -> Result<(&str, &str)> {
    match word.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.trim(), v.trim())),
        _ => bail!("expected key=value, got '{word}'"),
    }
}

fn name_and_params(words: &[String]) -> Result<(&str, Vec<(String, DataValue)>)> {
    let Some((name, rest)) = words.split_first() else {
        bail!("missing component name");
    };
    let params = rest
        .iter()
        .map(|w| split_pair(w).map(|(k, v)| (k.to_string(), parse_value(v))))
        .collect::<Result<Vec<_>>>()?;
    Ok((name.as_str(), params))
}

/// Numbers and booleans are typed; everything else stays text.
fn parse_value(text: &str) -> DataValue {
    if let Ok(v) = text.parse::<f64>() {
        return DataValue::Number(v);
    }
    match text {
        "true" | "True" => DataValue::Bool(true),
        "false" | "False" => DataValue::Bool(false),
        _ => DataValue::Text(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("2.5"), DataValue::Number(2.5));
        assert_eq!(parse_value("true"), DataValue::Bool(true));
        assert_eq!(parse_value("1,100"), DataValue::Text("1,100".to_string()));
    }

    #[test]
    fn test_cli_composes_layers() {
        let cli = Cli::try_parse_from([
            "trueno-gg", "d.csv", "--aes", "x=a", "--aes", "y=b", "--geom", "point", "color=red", "--geom",
            "line", "--scale", "y_log10", "limits=1,100", "--facet", "wrap", "var=g",
        ])
        .unwrap();
        let df = DataFrame::new()
            .with_column("a", vec![1.0, 2.0])
            .unwrap()
            .with_column("b", vec![3.0, 40.0])
            .unwrap()
            .with_column("g", vec!["u", "v"])
            .unwrap();
        let plot = compose(&cli, df).unwrap();
        assert_eq!(plot.layers().len(), 2);
        assert_eq!(plot.scales().len(), 1);
        let built = plot.build().unwrap();
        assert_eq!(built.layout().len(), 2);
    }

    #[test]
    fn test_unknown_geom_names_identifier() {
        let cli = Cli::try_parse_from(["trueno-gg", "d.csv", "--geom", "pointz"]).unwrap();
        let err = compose(&cli, DataFrame::new()).unwrap_err();
        assert!(err.to_string().contains("pointz"));
    }
}
