use std::fs;
use std::path::Path;

use decision_match::config::{PathsConfig, WeakLabelParams};
use decision_match::labeling::label_by_score;
use decision_match::prediction::{PredictRequest, PredictionService};
use decision_match::records::{ingest, InterimTables, RawInputs};
use decision_match::reports::run_drift_report;
use decision_match::scoring::{score_pairs, SCORES_FILE};
use decision_match::training::{
    load_threshold, train_baseline, train_cross_validated, TrainingCorpus,
};
use serde_json::{json, Map, Value};

struct JobFixture {
    code: &'static str,
    title: &'static str,
    skills: &'static str,
}

const JOBS: &[JobFixture] = &[
    JobFixture {
        code: "4530",
        title: "Engenheiro de Dados",
        skills: "python sql spark airflow pipelines",
    },
    JobFixture {
        code: "4531",
        title: "Desenvolvedor Backend",
        skills: "java spring kubernetes microsservicos",
    },
    JobFixture {
        code: "4532",
        title: "Desenvolvedor Frontend",
        skills: "react typescript css acessibilidade",
    },
];

const HIRED: &str = "Contratado pela Decision";
const REJECTED: &str = "Desistiu";

/// Four matching hires and four mismatched rejections per job.
fn write_raw_inputs(data_dir: &Path) {
    let mut jobs = Map::new();
    let mut prospects = Map::new();
    let mut applicants = Map::new();

    for (job_index, job) in JOBS.iter().enumerate() {
        jobs.insert(
            job.code.to_string(),
            json!({
                "informacoes_basicas": { "titulo_vaga": job.title },
                "perfil_vaga": {
                    "principais_atividades": format!("atuar com {}", job.skills),
                    "competencia_tecnicas_e_comportamentais": job.skills,
                },
                "beneficios": { "valor_venda": "-" },
            }),
        );

        let other = &JOBS[(job_index + 1) % JOBS.len()];
        let mut listed = Vec::new();
        for slot in 0..8 {
            let code = format!("{}{slot:02}", job.code);
            let (skills, status) = if slot < 4 {
                (job.skills, HIRED)
            } else {
                (other.skills, REJECTED)
            };
            applicants.insert(
                code.clone(),
                json!({
                    "infos_basicas": { "nome": format!("Pessoa {code}"), "objetivo_profissional": other.title },
                    "informacoes_profissionais": { "conhecimentos_tecnicos": skills },
                    "cv_pt": format!("experiencia com {skills}"),
                }),
            );
            listed.push(json!({
                "nome": format!("Pessoa {code}"),
                "codigo": code,
                "situacao_candidado": status,
                "comentario": "",
            }));
        }
        prospects.insert(
            job.code.to_string(),
            json!({ "titulo": job.title, "modalidade": "", "prospects": listed }),
        );
    }

    fs::create_dir_all(data_dir).expect("data dir");
    for (name, document) in [
        ("Jobs.json", jobs),
        ("Prospects.json", prospects),
        ("Applicants.json", applicants),
    ] {
        let body = serde_json::to_string(&Value::Object(document)).expect("serialize fixture");
        fs::write(data_dir.join(name), body).expect("write fixture");
    }
}

#[test]
fn raw_documents_flow_through_to_served_predictions() {
    let root = tempfile::tempdir().expect("tempdir");
    let paths = PathsConfig::rooted_at(root.path());
    write_raw_inputs(&paths.data_dir);

    let inputs = RawInputs::locate(&paths).expect("raw inputs found");
    let ingested = ingest(&inputs, &paths.interim_dir()).expect("ingest");
    assert_eq!(ingested.jobs, 3);
    assert_eq!(ingested.prospects, 24);
    assert_eq!(ingested.applicants, 24);

    let tables = InterimTables::in_dir(&paths.interim_dir());
    let scored = score_pairs(&tables, &paths.processed_dir()).expect("scores");
    assert_eq!(scored.pairs, 24);
    assert_eq!(scored.jobs, 3);

    let labels = label_by_score(
        &tables.prospects,
        &paths.processed_dir().join(SCORES_FILE),
        &paths.processed_dir(),
        &WeakLabelParams::default(),
        None,
    )
    .expect("weak labels");
    assert_eq!(labels.counts.total, 24);
    assert!(labels.counts.positivos >= 1);
    assert!(labels.counts.positivos <= 2 * JOBS.len());
    assert!(labels.meta.exists());

    let corpus = TrainingCorpus::load(&inputs).expect("corpus");
    let (metrics, outputs) = train_baseline(&corpus, &paths.models_dir).expect("baseline");
    assert_eq!(metrics.n_total, 24);
    assert_eq!(metrics.n_train + metrics.n_val, 24);
    assert!((0.2..=0.8).contains(&metrics.threshold_final));
    assert!(outputs.model.exists());
    assert!(outputs.metrics.exists());
    let threshold_file = outputs.threshold.expect("threshold path");
    let saved = load_threshold(&threshold_file).expect("threshold");
    assert!((saved - metrics.threshold_final).abs() < 1e-12);

    let (cv_metrics, cv_outputs) =
        train_cross_validated(&corpus, &paths.models_dir).expect("cross validation");
    assert_eq!(cv_metrics.n_splits, 5);
    assert_eq!(cv_metrics.n_total, 24);
    assert!(cv_outputs.model.exists());
    assert!(cv_outputs.threshold.is_none());

    let drift = run_drift_report(&corpus, &paths.docs_dir).expect("drift report");
    assert_eq!(drift.summary.n_ref + drift.summary.n_cur, 24);
    assert!(drift.html.exists());
    assert!(drift.json.exists());

    let service = PredictionService::from_models_dir(&paths.models_dir);
    let health = service.health();
    assert!(health.model_loaded);
    assert!((health.threshold - metrics.threshold_final).abs() < 1e-12);

    let request: PredictRequest = serde_json::from_value(json!({
        "job_text": "engenheiro de dados python sql spark airflow",
        "cand_text": "experiencia com python sql spark airflow pipelines",
        "score_tecnico": 0.8,
        "situacao_norm": "encaminhado ao requisitante",
    }))
    .expect("request");
    let response = service
        .predict(request.validate().expect("valid request"))
        .expect("prediction");
    assert!((0.0..=1.0).contains(&response.y_prob));
    assert_eq!(response.y_pred == 1, response.y_prob >= response.details.threshold);
    assert_eq!(response.details.mode.as_deref(), Some("raw"));
}

#[test]
fn training_without_raw_inputs_reports_the_missing_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let paths = PathsConfig::rooted_at(root.path());
    let error = RawInputs::locate(&paths).expect_err("nothing to locate");
    assert!(error.to_string().contains("Jobs.json"));
}
