//! Interview analytics, the markdown report and the drift report.

pub mod charts;
pub mod drift;
pub mod interviews;
pub mod markdown;

pub use charts::{histogram_svg, BarChart, Series};
pub use drift::{run_drift_report, DriftOutputs, DriftSummary};
pub use interviews::{GroupBy, Grouped, InterviewAnalytics};
pub use markdown::{render_report, ChartLink};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::PathsConfig;
use crate::records::{read_interviews, RecordsError};
use crate::training::TrainingError;

pub const REPORT_FILE: &str = "relatorio.md";
pub const WORDS_BY_VAGA_CHART: &str = "avg_words_by_vaga.svg";
pub const WORDS_BY_CANDIDATO_CHART: &str = "avg_words_by_candidato.svg";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn create_parent(path: &Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> ReportError + '_ {
    move |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Serialize `rows` with a header derived from their field names.
pub(crate) fn write_csv_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;
    for row in rows {
        writer.serialize(row).map_err(csv_error(path))?;
    }
    writer
        .flush()
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Write an explicit header followed by pre-rendered rows.
pub(crate) fn write_csv_records(
    path: &Path,
    header: &[String],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), ReportError> {
    create_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error(path))?;
    writer.write_record(header).map_err(csv_error(path))?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error(path))?;
    }
    writer
        .flush()
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn write_text(path: &Path, body: &str) -> Result<(), ReportError> {
    create_parent(path)?;
    fs::write(path, body).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &body)
}

/// What `interviews` produced.
#[derive(Debug, Clone)]
pub struct InterviewReportSummary {
    pub interviews: usize,
    pub tables: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
    pub report: PathBuf,
}

fn words_chart(grouped: &Grouped<f64>, title: &str, x_label: &str) -> BarChart {
    BarChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: "Média de palavras".to_string(),
        bars: grouped.rows.clone(),
    }
}

/// Analyse the interview answers: CSV tables under `processed`, SVG charts
/// under `docs/media` and the markdown report under `docs`.
pub fn run_interview_reports(paths: &PathsConfig) -> Result<InterviewReportSummary, ReportError> {
    let records = read_interviews(&paths.interviews_csv())?;
    let analytics = InterviewAnalytics::from_records(records);
    info!(interviews = analytics.clean.len(), "interviews loaded");

    let tables = analytics.write_tables(&paths.processed_dir())?;

    let media = paths.media_dir();
    let mut charts = Vec::new();
    let mut links = Vec::new();
    for (file, grouped, heading, alt, x_label) in [
        (
            WORDS_BY_VAGA_CHART,
            &analytics.words_by_vaga,
            "Visualização: média de palavras por vaga",
            "Média de palavras por vaga",
            "Vaga",
        ),
        (
            WORDS_BY_CANDIDATO_CHART,
            &analytics.words_by_candidato,
            "Visualização: média de palavras por candidato",
            "Média de palavras por candidato",
            "Candidato",
        ),
    ] {
        if grouped.rows.is_empty() {
            continue;
        }
        let path = media.join(file);
        write_text(&path, &words_chart(grouped, alt, x_label).to_svg())?;
        links.push(ChartLink {
            heading: heading.to_string(),
            alt: alt.to_string(),
            relative_path: format!("media/{file}"),
        });
        charts.push(path);
    }

    let report = paths.docs_dir.join(REPORT_FILE);
    let generated_at = chrono::Local::now().naive_local();
    write_text(&report, &render_report(&analytics, &links, generated_at))?;
    info!(
        tables = tables.len(),
        charts = charts.len(),
        report = %report.display(),
        "interview report written"
    );

    Ok(InterviewReportSummary {
        interviews: analytics.clean.len(),
        tables,
        charts,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVIEWS: &str = "id,candidato,vaga,pergunta,resposta,data\n\
        1,Ana,Dados,Fale de você,Trabalho com Python e SQL há cinco anos,2024-05-01\n\
        2,Bruno,Backend,Experiência?,Docker e Kubernetes em produção,2024-05-02\n\
        3,Caio,Backend,Experiência?,,2024-05-03\n";

    #[test]
    fn interview_reports_write_tables_charts_and_markdown() {
        let root = tempfile::tempdir().expect("tempdir");
        let paths = PathsConfig::rooted_at(root.path());
        fs::create_dir_all(&paths.data_dir).expect("data dir");
        fs::write(paths.interviews_csv(), INTERVIEWS).expect("write interviews");

        let summary = run_interview_reports(&paths).expect("reports");
        assert_eq!(summary.interviews, 3);
        assert_eq!(summary.tables.len(), 9);
        assert!(summary.tables.iter().all(|path| path.exists()));
        assert_eq!(summary.charts.len(), 2);
        assert!(paths.media_dir().join(WORDS_BY_VAGA_CHART).exists());

        let report = fs::read_to_string(&summary.report).expect("report");
        assert!(report.contains("- Total de entrevistas: **3**"));
        assert!(report.contains("(media/avg_words_by_candidato.svg)"));
    }

    #[test]
    fn missing_interviews_file_is_a_records_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let paths = PathsConfig::rooted_at(root.path());
        let error = run_interview_reports(&paths).expect_err("no interviews");
        assert!(matches!(error, ReportError::Records(_)));
    }

    #[test]
    fn explicit_header_is_written_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("table.csv");
        let header = vec!["vaga".to_string(), "avg_words".to_string()];
        let rows = vec![vec!["Dados".to_string(), "7".to_string()]];
        write_csv_records(&path, &header, rows.into_iter()).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "vaga,avg_words\nDados,7\n");
    }
}
