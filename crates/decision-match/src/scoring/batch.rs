use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::similarity::compute_similarity;
use super::ScoringError;
use crate::records::{
    read_prospects_csv, FlatTable, InterimTables, TextProfile, CANDIDATE_ID_COLUMN, JOB_ID_COLUMN,
};
use crate::text::normalize_text;

pub const SCORES_FILE: &str = "scores.csv";

const PROGRESS_EVERY: usize = 200;

/// Similarity of one candidate to one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub vaga_code: String,
    pub candidato_code: String,
    pub score_tecnico: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSummary {
    pub pairs: usize,
    pub jobs: usize,
    pub empty_job_texts: usize,
    pub empty_candidate_texts: usize,
    pub output: PathBuf,
}

/// Score every distinct (job, candidate) pair listed in the interim prospects
/// table and write `scores.csv` under `processed_dir`.
pub fn score_pairs(tables: &InterimTables, processed_dir: &Path) -> Result<ScoringSummary, ScoringError> {
    let jobs = FlatTable::read_csv(&tables.jobs)?;
    let applicants = FlatTable::read_csv(&tables.applicants)?;
    let prospects = read_prospects_csv(&tables.prospects)?;

    let job_texts = TextProfile::job().texts_by_id(&jobs, JOB_ID_COLUMN);
    let cand_texts = TextProfile::candidate().texts_by_id(&applicants, CANDIDATE_ID_COLUMN);
    let empty_job_texts = job_texts.values().filter(|text| text.is_empty()).count();
    let empty_candidate_texts = cand_texts.values().filter(|text| text.is_empty()).count();
    info!(empty_job_texts, empty_candidate_texts, "entity texts assembled");

    let mut seen = HashSet::new();
    let mut job_order = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for prospect in prospects.iter().filter(|prospect| prospect.has_pair()) {
        let pair = (prospect.vaga_code.clone(), prospect.candidato_code.clone());
        if !seen.insert(pair) {
            continue;
        }
        let candidates = groups.entry(prospect.vaga_code.clone()).or_insert_with(|| {
            job_order.push(prospect.vaga_code.clone());
            Vec::new()
        });
        candidates.push(prospect.candidato_code.clone());
    }
    info!(pairs = seen.len(), jobs = job_order.len(), "unique pairs collected");

    let mut scores = Vec::with_capacity(seen.len());
    for (position, vaga_code) in job_order.iter().enumerate() {
        let candidates = &groups[vaga_code];
        let job_text = normalize_text(job_texts.get(vaga_code).map_or("", String::as_str));
        let texts: Vec<String> = candidates
            .iter()
            .map(|code| normalize_text(cand_texts.get(code).map_or("", String::as_str)))
            .collect();

        let similarities = compute_similarity(&job_text, &texts);
        debug!(vaga_code = %vaga_code, candidates = candidates.len(), "job scored");
        scores.extend(candidates.iter().zip(similarities).map(|(code, score)| PairScore {
            vaga_code: vaga_code.clone(),
            candidato_code: code.clone(),
            score_tecnico: score,
        }));

        let done = position + 1;
        if done % PROGRESS_EVERY == 0 || done == job_order.len() {
            info!(done, total = job_order.len(), "jobs processed");
        }
    }

    let output = processed_dir.join(SCORES_FILE);
    write_scores(&output, &scores)?;
    info!(path = %output.display(), rows = scores.len(), "scores written");

    Ok(ScoringSummary {
        pairs: scores.len(),
        jobs: job_order.len(),
        empty_job_texts,
        empty_candidate_texts,
        output,
    })
}

pub fn write_scores(path: &Path, scores: &[PairScore]) -> Result<(), ScoringError> {
    let write_error = |source| ScoringError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| write_error(csv::Error::from(err)))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_error)?;
    writer
        .write_record(["vaga_code", "candidato_code", "score_tecnico"])
        .map_err(write_error)?;
    for score in scores {
        writer.serialize(score).map_err(write_error)?;
    }
    writer
        .flush()
        .map_err(|err| write_error(csv::Error::from(err)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ingest, RawInputs};
    use serde_json::json;

    #[test]
    fn scores_each_unique_pair_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = RawInputs {
            jobs: dir.path().join("Jobs.json"),
            prospects: dir.path().join("Prospects.json"),
            applicants: dir.path().join("Applicants.json"),
        };
        std::fs::write(
            &inputs.jobs,
            json!({ "1": { "titulo": "Engenheiro de dados Python SQL" } }).to_string(),
        )
        .expect("jobs");
        std::fs::write(
            &inputs.prospects,
            json!({ "1": { "prospects": [
                { "codigo": "a" }, { "codigo": "b" }, { "codigo": "a" }, { "nome": "sem codigo" }
            ] } })
            .to_string(),
        )
        .expect("prospects");
        std::fs::write(
            &inputs.applicants,
            json!({
                "a": { "conhecimentos_tecnicos": "Python, SQL, engenharia de dados" },
                "b": { "conhecimentos_tecnicos": "Vendas e atendimento" }
            })
            .to_string(),
        )
        .expect("applicants");

        let summary = ingest(&inputs, &dir.path().join("interim")).expect("ingest");
        let scored = score_pairs(&summary.tables, &dir.path().join("processed")).expect("score");
        assert_eq!(scored.pairs, 2);
        assert_eq!(scored.jobs, 1);

        let mut reader = csv::Reader::from_path(&scored.output).expect("scores csv");
        let rows: Vec<PairScore> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(rows[0].candidato_code, "a");
        assert!(rows[0].score_tecnico > rows[1].score_tecnico);
    }
}
