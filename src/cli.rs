//! Command-line entry: one pipeline run over a local image.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{AiConfig, ConfigError};
use crate::models::{Constitution, Gender, PatientProfile};
use crate::pipeline::orchestrator::{PipelineError, PipelineOutput, RemedyPipeline, RemedyRequest};
use crate::pipeline::translation::{is_supported_language, supported_languages};

#[derive(Parser, Debug)]
#[command(name = "herbheal")]
#[command(about = "Identify a herb from a photo and suggest an Ayurvedic remedy", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Photo of the herb
    pub image: PathBuf,

    /// Condition to treat, e.g. "dry cough"
    pub condition: String,

    /// Patient age in years
    pub age: Option<u32>,

    /// Male, Female or Other
    pub gender: Option<Gender>,

    /// Vata, Pitta, Kapha, Vata-Pitta, Pitta-Kapha, Vata-Kapha or Tri-Dosha
    pub constitution: Option<Constitution>,

    /// Target language code (en, hi, ta, te, bn, mr, kn, ml)
    #[arg(value_parser = parse_language)]
    pub language: Option<String>,

    /// Delete the image after the run, as the upload service does
    #[arg(long)]
    pub remove_image: bool,
}

fn parse_language(code: &str) -> Result<String, String> {
    let code = code.trim().to_lowercase();
    if is_supported_language(&code) {
        Ok(code)
    } else {
        Err(format!(
            "unsupported language '{code}', expected one of: {}",
            supported_languages().collect::<Vec<_>>().join(", ")
        ))
    }
}

impl Cli {
    pub fn into_request(self) -> RemedyRequest {
        let mut request = RemedyRequest::new(self.image, &self.condition).with_profile(
            PatientProfile {
                age: self.age,
                gender: self.gender,
                constitution: self.constitution,
            },
        );
        if let Some(language) = &self.language {
            request = request.with_language(language);
        }
        if !self.remove_image {
            request = request.keep_upload();
        }
        request
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Run the pipeline for parsed arguments and render the output as pretty JSON.
pub fn execute(cli: Cli) -> Result<String, CliError> {
    let config = AiConfig::from_env()?;
    let pipeline = RemedyPipeline::from_config(&config);
    let output: PipelineOutput = pipeline.run(&cli.into_request())?;
    Ok(serde_json::to_string_pretty(&output)?)
}
