#![doc = include_str!("../README.md")]

mod table;

use {
    anyhow::{Context as _, Result, bail},
    kanabun::{
        Config, Engine,
        analyzer::{Analyzer, CommandAnalyzer},
        convert::OutputMode,
        document::Document,
        format::{OutputFormat, decode_text},
        odoriji::pre_expand,
        replay::{EditSet, replay},
        store::{DocumentPair, DocumentStore},
    },
    std::{
        fs,
        path::{Path, PathBuf},
    },
    tracing::{error, info, level_filters::LevelFilter},
    tracing_subscriber::EnvFilter,
};

#[derive(Debug, clap::Parser)]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Analyzer backend
    #[arg(long, value_enum, default_value_t = Backend::Command)]
    backend: Backend,
    /// MeCab executable, for the `command` backend
    #[arg(long, default_value = CommandAnalyzer::DEFAULT_PROGRAM)]
    mecab: PathBuf,
    /// Dictionary directory, containing a `dicrc`
    #[arg(long, short)]
    dictionary: Option<PathBuf>,
    /// MeCab rule configuration (`mecabrc`)
    #[arg(long)]
    rc: Option<PathBuf>,
    /// Dictionary feature field holding the reading
    ///
    /// For the `lindera` backend this is a detail column, defaulting to 9.
    #[arg(long)]
    reading_field: Option<usize>,
    /// Local name of verse line elements
    #[arg(long)]
    line_tag: Option<String>,
    /// Local name of segment elements
    #[arg(long)]
    segment_tag: Option<String>,
    /// Do not expand iteration marks when counting morae
    #[arg(long)]
    no_count_expand: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Backend {
    /// Run the MeCab executable
    Command,
    /// Use libmecab in-process
    #[cfg(feature = "mecab")]
    Mecab,
    /// Use Lindera with its embedded dictionary
    #[cfg(feature = "lindera")]
    Lindera,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Convert text and XML files into kana
    Convert {
        /// Files to convert (`.txt` or `.xml`)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory to write converted files into
        #[arg(long, short, default_value = ".")]
        out_dir: PathBuf,
        /// Output file format
        #[arg(long, short, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,
        /// Output script
        #[arg(long, short)]
        mode: Option<OutputMode>,
        /// Do not expand iteration marks
        #[arg(long)]
        no_expand: bool,
        /// Validate converted XML files afterwards
        #[arg(long)]
        check: bool,
    },
    /// Check the verse structure of a converted XML file
    Check {
        /// File before conversion
        #[arg(long)]
        original: PathBuf,
        /// File after conversion
        converted: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write corrected segment texts into a converted XML file
    Fix {
        /// File before conversion
        #[arg(long)]
        original: PathBuf,
        /// File after conversion
        converted: PathBuf,
        /// JSON object of line label to its 5 segment texts
        #[arg(long, short)]
        edits: PathBuf,
        /// Where to write the corrected file
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Expand iteration marks in some text, without analyzing it
    Expand {
        /// Text to expand
        text: String,
    },
    /// Print the reading of every token in some text
    Readings {
        /// Text to analyze
        text: String,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .without_time()
        .init();
    let args = <Args as clap::Parser>::parse();

    let config = load_config(&args)?;
    match args.command {
        Command::Expand { text } => {
            println!("{}", pre_expand(&text));
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Convert {
            inputs,
            out_dir,
            format,
            mode,
            no_expand,
            check,
        } => {
            let config = Config {
                output_mode: mode.unwrap_or(config.output_mode),
                expand_odoriji: config.expand_odoriji && !no_expand,
                ..config
            };
            let engine = engine(args.backend, &args.mecab, args.reading_field, config)?;
            convert(&engine, &inputs, &out_dir, format, check)
        }
        Command::Check {
            original,
            converted,
            json,
        } => {
            let engine = engine(args.backend, &args.mecab, args.reading_field, config)?;
            let pair = read_pair(&original, &converted)?;
            let report = engine
                .validate(&pair.original, &pair.converted)
                .context("failed to validate")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                table::print_report(&report);
            }
            Ok(())
        }
        Command::Fix {
            original,
            converted,
            edits,
            output,
        } => {
            let engine = engine(args.backend, &args.mecab, args.reading_field, config)?;
            fix(&engine, &original, &converted, &edits, &output)
        }
        Command::Readings { text } => {
            let engine = engine(args.backend, &args.mecab, args.reading_field, config)?;
            let readings = engine.readings(&text).context("failed to analyze")?;
            println!("{}", readings.join(" | "));
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path().context("failed to get default app directories")?,
    };
    info!("Using {path:?} as config path");
    let mut config = Config::load_or_default(&path).context("failed to load config")?;

    if let Some(dictionary) = &args.dictionary {
        config.dictionary_path = Some(dictionary.clone());
    }
    if let Some(rc) = &args.rc {
        config.rule_config_path = Some(rc.clone());
    }
    if let Some(reading_field) = args.reading_field {
        config.reading_field_index = reading_field;
    }
    if let Some(line_tag) = &args.line_tag {
        config.line_tag.clone_from(line_tag);
    }
    if let Some(segment_tag) = &args.segment_tag {
        config.segment_tag.clone_from(segment_tag);
    }
    if args.no_count_expand {
        config.expand_odoriji_when_counting = false;
    }
    Ok(config)
}

fn engine(
    backend: Backend,
    mecab: &Path,
    #[cfg_attr(not(feature = "lindera"), allow(unused_variables))] reading_field: Option<usize>,
    config: Config,
) -> Result<Engine> {
    let analyzer_config = config.analyzer();
    let analyzer: Box<dyn Analyzer> = match backend {
        Backend::Command => Box::new(
            CommandAnalyzer::new(mecab, analyzer_config).context("failed to start MeCab")?,
        ),
        #[cfg(feature = "mecab")]
        Backend::Mecab => Box::new(
            kanabun::analyzer::MecabAnalyzer::new(analyzer_config)
                .context("failed to create MeCab tagger")?,
        ),
        #[cfg(feature = "lindera")]
        Backend::Lindera => {
            use kanabun::analyzer::LinderaAnalyzer;

            // the configured field indexes MeCab's feature string, not Lindera's details
            let reading_field = reading_field.unwrap_or(LinderaAnalyzer::DEFAULT_READING_FIELD);
            Box::new(LinderaAnalyzer::new(reading_field).context("failed to load Lindera")?)
        }
    };
    Ok(Engine::new(analyzer, config))
}

fn convert(
    engine: &Engine,
    inputs: &[PathBuf],
    out_dir: &Path,
    format: OutputFormat,
    check: bool,
) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {out_dir:?}"))?;

    let mut store = DocumentStore::new();
    let mut num_failed = 0usize;
    for input in inputs {
        if let Err(err) = convert_file(engine, input, out_dir, format, &mut store) {
            error!("Failed to convert {input:?}: {err:?}");
            num_failed += 1;
        }
    }

    if check {
        for (name, pair) in store.iter() {
            let report = match engine.validate(&pair.original, &pair.converted) {
                Ok(report) => report,
                Err(err) => {
                    error!("Failed to validate {name:?}: {err:?}");
                    num_failed += 1;
                    continue;
                }
            };
            println!("{name}");
            table::print_report(&report);
        }
    }

    if num_failed > 0 {
        bail!("{num_failed} of {} files failed", inputs.len());
    }
    Ok(())
}

fn convert_file(
    engine: &Engine,
    input: &Path,
    out_dir: &Path,
    format: OutputFormat,
    store: &mut DocumentStore,
) -> Result<()> {
    let data = fs::read(input).context("failed to read file")?;
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .context("file has no name")?;
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .context("file has no name")?;
    let is_xml = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));

    let out = if is_xml {
        let original = Document::from_bytes(&data).context("failed to parse XML")?;
        let converted = engine
            .convert_document(&original)
            .context("failed to convert XML")?;
        let out = match format {
            OutputFormat::Xml => converted.as_str().as_bytes().to_vec(),
            OutputFormat::Txt | OutputFormat::Csv => {
                let texts = converted
                    .texts_of(&engine.config().line_tag)
                    .context("failed to extract lines")?;
                format.render(&texts)
            }
        };
        store.insert(
            name,
            DocumentPair {
                original,
                converted,
            },
        );
        out
    } else {
        let text = decode_text(&data);
        let converted = engine
            .convert_lines(&text)
            .context("failed to convert text")?;
        format.render(&[converted])
    };

    let out_path = out_dir.join(format!("{stem}.{}", format.extension()));
    fs::write(&out_path, out).with_context(|| format!("failed to write {out_path:?}"))?;
    info!("Converted {input:?} -> {out_path:?}");
    Ok(())
}

fn read_pair(original: &Path, converted: &Path) -> Result<DocumentPair> {
    let read = |path: &Path| -> Result<Document> {
        let data = fs::read(path).with_context(|| format!("failed to read {path:?}"))?;
        Document::from_bytes(&data).with_context(|| format!("failed to parse {path:?}"))
    };
    Ok(DocumentPair {
        original: read(original)?,
        converted: read(converted)?,
    })
}

fn fix(
    engine: &Engine,
    original: &Path,
    converted: &Path,
    edits: &Path,
    output: &Path,
) -> Result<()> {
    let pair = read_pair(original, converted)?;
    let edits = fs::read_to_string(edits).context("failed to read edits")?;
    let edits = serde_json::from_str::<EditSet>(&edits).context("failed to parse edits")?;

    let report = engine
        .validate(&pair.original, &pair.converted)
        .context("failed to validate")?;
    let unknown = edits
        .keys()
        .filter(|label| !report.mismatches().any(|line| &line.label == *label))
        .count();
    if unknown > 0 {
        info!("Skipping {unknown} edits for lines which are not mismatched");
    }

    let fixed = replay(&pair.converted, &report, &edits, &engine.config().tags())
        .context("failed to apply edits")?;
    fs::write(output, fixed.as_str()).with_context(|| format!("failed to write {output:?}"))?;

    let recheck = engine
        .validate(&pair.original, &fixed)
        .context("failed to validate fixed file")?;
    info!(
        "Wrote {output:?}, {} lines still mismatched",
        recheck.mismatches().count()
    );
    Ok(())
}
