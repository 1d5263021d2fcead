use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use skin_classifier::{
    batch::{predict_folder, run_batch_with},
    config::{DEFAULT_CLASS_MAP_PATH, DEFAULT_IMAGE_SIZE, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_CSV},
    image::{ImagePreprocessor, ImageScanner, PreprocessOptions},
    models::ModelManager,
    report::{evaluate_directory, PredictionAnalysis, DEFAULT_HISTOGRAM_BINS},
    BatchOptions, Config, TensorLayout,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skin-classifier")]
#[command(about = "Skin-condition image classification: batch CSV predictions, evaluation and reports")]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    model: ModelArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct ModelArgs {
    /// Classifier artifact (ONNX)
    #[arg(long, alias = "model_path", global = true, default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Label -> index mapping (JSON)
    #[arg(long, alias = "class_map_path", global = true, default_value = DEFAULT_CLASS_MAP_PATH)]
    class_map_path: PathBuf,

    /// Resize width
    #[arg(long, global = true, default_value_t = DEFAULT_IMAGE_SIZE)]
    width: u32,

    /// Resize height
    #[arg(long, global = true, default_value_t = DEFAULT_IMAGE_SIZE)]
    height: u32,

    /// Input tensor layout expected by the model
    #[arg(long, global = true, value_enum, default_value_t = TensorLayout::Nhwc)]
    layout: TensorLayout,

    /// Number of ONNX Runtime intra-op threads
    #[arg(long, global = true)]
    intra_threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Batch predict images and save to CSV
    Batch {
        /// Folder containing images
        #[arg(long, alias = "image_dir")]
        image_dir: PathBuf,

        /// Output CSV path
        #[arg(long, alias = "output_csv", default_value = DEFAULT_OUTPUT_CSV)]
        output_csv: PathBuf,

        /// Recurse into subfolders
        #[arg(long)]
        recursive: bool,

        /// Min confidence to include
        #[arg(long, alias = "min_confidence", default_value_t = 0.0)]
        min_confidence: f64,

        /// Include predictions below min_confidence
        #[arg(long, alias = "include_low_confidence")]
        include_low_confidence: bool,

        /// Sharpen images before prediction
        #[arg(long)]
        sharpen: bool,
    },

    /// Print a prediction for every image in a folder
    Predict {
        #[arg(long, alias = "image_dir")]
        image_dir: PathBuf,

        #[arg(long)]
        recursive: bool,

        #[arg(long)]
        sharpen: bool,
    },

    /// Evaluate against a labeled folder (<dir>/<class>/<image>)
    Evaluate {
        #[arg(long, alias = "data_dir")]
        data_dir: PathBuf,
    },

    /// Summarize a predictions CSV
    Analyze {
        #[arg(long, default_value = DEFAULT_OUTPUT_CSV)]
        csv: PathBuf,

        /// Number of confidence histogram bins
        #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
        bins: usize,

        /// Also write the summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let model = &args.model;
    let build_config = || {
        Config::new(
            &model.model_path,
            &model.class_map_path,
            model.width,
            model.height,
            model.layout,
            model.intra_threads,
        )
    };

    match args.command {
        Command::Batch {
            image_dir,
            output_csv,
            recursive,
            min_confidence,
            include_low_confidence,
            sharpen,
        } => {
            let options = BatchOptions {
                image_dir,
                output_csv,
                recursive,
                min_confidence,
                include_low_confidence,
                sharpen,
            };
            options.validate()?;

            let config = build_config()?;
            let models = load_models(&config)?;
            let summary = run_batch_with(&models, &options)?;
            println!("{}", summary);
        }
        Command::Predict {
            image_dir,
            recursive,
            sharpen,
        } => {
            let scanner = ImageScanner::new(image_dir, recursive)?;
            let config = build_config()?;
            let models = load_models(&config)?;
            let preprocessor =
                ImagePreprocessor::new(PreprocessOptions::from_config(&config).with_sharpen(sharpen))?;

            for (path, result) in predict_folder(&models, &preprocessor, &scanner) {
                match result {
                    Ok(prediction) => println!("{}", prediction),
                    Err(e) => println!("{}", error_line(&path, &e)),
                }
            }
        }
        Command::Evaluate { data_dir } => {
            let config = build_config()?;
            let models = load_models(&config)?;
            let preprocessor = ImagePreprocessor::new(PreprocessOptions::from_config(&config))?;
            let evaluation = evaluate_directory(&models, &preprocessor, &data_dir)?;
            println!("{}", evaluation);
        }
        Command::Analyze { csv, bins, json } => {
            let analysis = PredictionAnalysis::from_csv(&csv, bins)?;
            println!("{}", analysis);
            if let Some(json_path) = json {
                analysis.write_json(&json_path)?;
                println!("Analysis saved at: {}", json_path.display());
            }
        }
    }

    Ok(())
}

/// 预测失败时只打印文件名
fn error_line(path: &Path, error: &dyn std::fmt::Display) -> String {
    let filename = path.file_name().unwrap_or(path.as_os_str());
    format!("Error processing {}: {}", filename.to_string_lossy(), error)
}

fn load_models(config: &Config) -> Result<ModelManager> {
    let models = ModelManager::load(config)?;
    let stats = models.get_stats();
    tracing::info!(
        "Model ready: classes={}, input={}x{} ({:?}), intra_threads={}",
        stats.num_classes,
        stats.input_width,
        stats.input_height,
        stats.layout,
        stats.intra_threads
    );
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_batch_underscore_aliases_and_defaults() {
        let args = Args::try_parse_from([
            "skin-classifier",
            "batch",
            "--image_dir",
            "photos",
            "--min_confidence",
            "0.5",
        ])
        .unwrap();

        assert_eq!(args.log_level, "info");
        assert_eq!(args.model.model_path, PathBuf::from("model/models/skin_model.onnx"));
        assert_eq!(args.model.class_map_path, PathBuf::from("model/models/class_indices.json"));
        assert_eq!((args.model.width, args.model.height), (224, 224));
        assert_eq!(args.model.layout, TensorLayout::Nhwc);
        assert_eq!(args.model.intra_threads, None);

        match args.command {
            Command::Batch {
                image_dir,
                output_csv,
                recursive,
                min_confidence,
                include_low_confidence,
                sharpen,
            } => {
                assert_eq!(image_dir, PathBuf::from("photos"));
                assert_eq!(output_csv, PathBuf::from("model/reports/predictions.csv"));
                assert_eq!(min_confidence, 0.5);
                assert!(!recursive);
                assert!(!include_low_confidence);
                assert!(!sharpen);
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_batch_flags_and_global_model_args() {
        let args = Args::try_parse_from([
            "skin-classifier",
            "batch",
            "--image-dir",
            "photos",
            "--output_csv",
            "out/preds.csv",
            "--include_low_confidence",
            "--recursive",
            "--model_path",
            "other.onnx",
            "--width",
            "128",
            "--layout",
            "nchw",
        ])
        .unwrap();

        assert_eq!(args.model.model_path, PathBuf::from("other.onnx"));
        assert_eq!(args.model.width, 128);
        assert_eq!(args.model.height, 224);
        assert_eq!(args.model.layout, TensorLayout::Nchw);

        match args.command {
            Command::Batch {
                output_csv,
                recursive,
                min_confidence,
                include_low_confidence,
                ..
            } => {
                assert_eq!(output_csv, PathBuf::from("out/preds.csv"));
                assert!(recursive);
                assert!(include_low_confidence);
                assert_eq!(min_confidence, 0.0);
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_error_line_uses_file_name() {
        let error = skin_classifier::SkinError::Inference("bad output shape".to_string());
        assert_eq!(
            error_line(Path::new("/data/photos/mole.jpg"), &error),
            "Error processing mole.jpg: Inference failed: bad output shape"
        );
    }

    #[test]
    fn test_batch_requires_image_dir() {
        assert!(Args::try_parse_from(["skin-classifier", "batch"]).is_err());
    }
}
