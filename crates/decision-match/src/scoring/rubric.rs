//! Keyword rubric for interview answers.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use serde::Serialize;

use crate::text::word_tokens;

const PHRASE_BONUS: f64 = 2.0;
const BOOST: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Technical,
    Communication,
    Behavioural,
}

static TECHNICAL: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // languages
        "sql", "python", "java", "javascript", "typescript", "ts", "go", "golang", "rust", "ruby",
        "php", "scala", "kotlin", "swift", "r", "c", "cpp", "csharp", "dotnet",
        // web
        "spring", "springboot", "django", "flask", "fastapi", "rails", "laravel", "express",
        "node", "nodejs", "react", "next", "nextjs", "angular", "vue", "svelte",
        // data
        "pandas", "numpy", "sklearn", "scikit", "matplotlib", "seaborn", "spark", "pyspark",
        "hadoop", "hdfs", "hive", "presto", "trino", "databricks", "snowflake", "bigquery",
        "redshift", "synapse", "athena", "glue", "kafka", "kinesis", "airflow", "dagster",
        "prefect", "dbt", "etl", "elt", "pipeline", "batch", "stream", "streaming",
        // ml
        "xgboost", "lightgbm", "catboost", "lstm", "cnn", "rnn", "transformer", "bert", "gpt",
        "embedding", "embeddings", "feature", "features", "featurestore", "mlops", "mlflow",
        "precision", "recall", "f1", "roc", "auc", "mse", "rmse", "mae", "map", "ndcg",
        "silhouette",
        // cloud
        "aws", "gcp", "azure", "ec2", "s3", "lambda", "iam", "sqs", "sns", "cloudwatch",
        "cloudrun", "pubsub", "gke", "eks", "aks", "dataproc", "dataflow", "bigtable",
        "cloudfunctions", "appengine", "cloudbuild",
        // storage
        "mysql", "postgres", "postgresql", "sqlserver", "mssql", "oracle", "mongodb", "mongo",
        "redis", "elasticsearch", "kibana", "clickhouse", "cassandra", "dynamodb", "cosmosdb",
        // devops
        "docker", "kubernetes", "k8s", "terraform", "ansible", "jenkins", "github", "gitlab",
        "git", "ci", "cd", "cicd", "helm", "prometheus", "grafana", "sonarqube", "artifactory",
        "sentry",
        // testing
        "pytest", "unittest", "tdd", "bdd", "integration", "integracao", "unitario", "unitarios",
        "testes", "teste", "qa",
        // apis and systems
        "api", "rest", "graphql", "grpc", "webhook", "oauth", "jwt", "linux", "shell", "bash",
        "zsh", "powershell", "windows", "macos", "microservicos", "microservices", "eventos",
        "orquestracao", "observabilidade",
    ]
    .into_iter()
    .collect()
});

static COMMUNICATION: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "comunicacao", "claridade", "clareza", "objetividade", "sintese", "didatica",
        "storytelling", "apresentacao", "apresentei", "apresentar", "documentacao", "documentei",
        "documentar", "relatorio", "relatorios", "alinhamento", "alinhei", "alinhar",
        "facilitacao", "facilitei", "facilitar", "mediacao", "mediador", "moderacao",
        "moderador", "feedback", "negociacao", "negociar", "reuniao", "reunioes", "stakeholders",
        "cliente", "clientes", "sponsor", "patrocinador", "briefing", "requisitos",
        "especificacao", "kpis", "okrs", "planejamento", "planning", "kickoff", "followup",
        "follow", "roadmap", "userstory", "historia", "historias", "criterios", "criterio",
        "aceitacao", "backlog", "grooming", "refinement", "prioridades", "priorizacao",
        "priorizar",
    ]
    .into_iter()
    .collect()
});

static BEHAVIOURAL: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "proativo", "proatividade", "resiliencia", "resiliente", "colaboracao", "colaborar",
        "colaborativo", "cooperacao", "cooperar", "teamwork", "time", "equipe", "trabalho",
        "ownership", "accountability", "autonomia", "protagonismo", "lideranca", "lider",
        "mentoria", "mentor", "mentorei", "ensinei", "aprendi", "aprendizado", "curiosidade",
        "resolvi", "resolucao", "resolver", "problema", "problemas", "desafio", "desafios",
        "compromisso", "comprometimento", "motivacao", "engajamento", "etica", "etico",
        "organizacao", "prioridade", "prioridades", "priorizacao", "planejamento",
        "adaptabilidade", "adaptavel", "flexibilidade", "agilidade", "agil", "foco",
        "pontualidade", "disciplina", "persistencia", "iniciativa", "melhoria", "inovacao",
        "criatividade", "empatia", "escuta", "humildade", "confianca",
    ]
    .into_iter()
    .collect()
});

const PHRASES: &[(&str, Dimension)] = &[
    ("machine learning", Dimension::Technical),
    ("aprendizado de maquina", Dimension::Technical),
    ("feature store", Dimension::Technical),
    ("k fold", Dimension::Technical),
    ("cloud run", Dimension::Technical),
    ("ci cd", Dimension::Technical),
    ("event driven", Dimension::Technical),
    ("boa comunicacao", Dimension::Communication),
    ("gestao de stakeholders", Dimension::Communication),
    ("historias de usuario", Dimension::Communication),
    ("criterios de aceitacao", Dimension::Communication),
    ("trabalho em equipe", Dimension::Behavioural),
    ("melhoria continua", Dimension::Behavioural),
    ("escuta ativa", Dimension::Behavioural),
    ("sentido de dono", Dimension::Behavioural),
];

/// Rubric scores of one answer, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RubricScores {
    pub score_tecnico: f64,
    pub score_comunicacao: f64,
    pub score_comportamental: f64,
}

/// Score an already cleaned answer.
///
/// Dictionary hits over `[a-z0-9]+` tokens, plus a fixed bonus for each key
/// phrase found, are divided by the token count, boosted and capped at 1.
pub fn score_text(clean_text: &str) -> RubricScores {
    let text = clean_text.to_lowercase();
    let tokens = word_tokens(&text);
    if tokens.is_empty() {
        return RubricScores::default();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &tokens {
        *counts.entry(token.as_str()).or_default() += 1;
    }

    let hits = |dictionary: &HashSet<&'static str>| -> f64 {
        counts
            .iter()
            .filter(|(token, _)| dictionary.contains(*token))
            .map(|(_, count)| *count as f64)
            .sum()
    };
    let mut technical = hits(&TECHNICAL);
    let mut communication = hits(&COMMUNICATION);
    let mut behavioural = hits(&BEHAVIOURAL);

    for (phrase, dimension) in PHRASES {
        if text.contains(phrase) {
            match dimension {
                Dimension::Technical => technical += PHRASE_BONUS,
                Dimension::Communication => communication += PHRASE_BONUS,
                Dimension::Behavioural => behavioural += PHRASE_BONUS,
            }
        }
    }

    let total = tokens.len() as f64;
    let scale = |value: f64| (value / total * BOOST).min(1.0);
    RubricScores {
        score_tecnico: scale(technical),
        score_comunicacao: scale(communication),
        score_comportamental: scale(behavioural),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(score_text(""), RubricScores::default());
        assert_eq!(score_text(" ... "), RubricScores::default());
    }

    #[test]
    fn hits_are_relative_to_token_count() {
        // 2 technical hits over 6 tokens, boosted: 2 / 6 * 3 = 1.0
        let scores = score_text("usei python e sql no projeto");
        assert!((scores.score_tecnico - 1.0).abs() < 1e-12);
        assert_eq!(scores.score_comunicacao, 0.0);

        // 1 hit over 10 tokens: 0.3
        let scores = score_text("eu gosto muito de trabalhar com python todo dia mesmo");
        assert!((scores.score_tecnico - 0.3).abs() < 1e-12);
    }

    #[test]
    fn phrases_add_a_bonus() {
        let scores = score_text("sempre pratiquei escuta ativa com o grupo inteiro hoje em dia la");
        // escuta (1) + phrase bonus (2) over 12 tokens, boosted: 0.75
        assert!((scores.score_comportamental - 0.75).abs() < 1e-12);
    }

    #[test]
    fn scores_are_capped() {
        let scores = score_text("python sql aws docker");
        assert_eq!(scores.score_tecnico, 1.0);
    }
}
