//! Markdown summary of the interview analytics.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::interviews::{Grouped, InterviewAnalytics, TermCount};

/// A chart already written next to the report, referenced by relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLink {
    pub heading: String,
    pub alt: String,
    pub relative_path: String,
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// GitHub table of at most `max_rows` rows.
pub fn md_table(headers: &[&str], rows: &[Vec<String>], max_rows: usize) -> String {
    let mut lines = vec![
        format!("| {} |", headers.join(" | ")),
        format!("| {} |", vec!["---"; headers.len()].join(" | ")),
    ];
    for row in rows.iter().take(max_rows) {
        let cells: Vec<String> = row.iter().map(|c| cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

fn term_rows(terms: &[&TermCount]) -> Vec<Vec<String>> {
    terms
        .iter()
        .map(|t| vec![t.term.clone(), t.count.to_string()])
        .collect()
}

fn grouped_terms(lines: &mut Vec<String>, title: &str, grouped: &Grouped<TermCount>) {
    if grouped.rows.is_empty() {
        return;
    }
    lines.push(format!("## {title}"));
    let mut start = 0;
    while start < grouped.rows.len() {
        let key = &grouped.rows[start].0;
        let members: Vec<&TermCount> = grouped.rows[start..]
            .iter()
            .take_while(|(other, _)| other == key)
            .map(|(_, term)| term)
            .collect();
        start += members.len();
        lines.push(format!("### {key}"));
        lines.push(md_table(&["term", "count"], &term_rows(&members), 10));
        lines.push(String::new());
    }
}

/// Counts per job in descending order; ties keep first appearance.
fn job_distribution(analytics: &InterviewAnalytics) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for interview in &analytics.clean {
        match positions.get(interview.vaga.as_str()) {
            Some(&position) => counts[position].1 += 1,
            None => {
                positions.insert(&interview.vaga, counts.len());
                counts.push((interview.vaga.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Render the full report. Sections without data are left out.
pub fn render_report(
    analytics: &InterviewAnalytics,
    charts: &[ChartLink],
    generated_at: NaiveDateTime,
) -> String {
    let mut lines = vec![
        "# Relatório de Análise (baseline)".to_string(),
        format!("_Gerado em {}_\n", generated_at.format("%Y-%m-%d %H:%M:%S")),
        "## Visão Geral do Dataset".to_string(),
        format!("- Total de entrevistas: **{}**", analytics.clean.len()),
    ];
    let distribution = job_distribution(analytics);
    if !distribution.is_empty() {
        let parts: Vec<String> = distribution
            .iter()
            .map(|(vaga, count)| format!("{vaga}: {count}"))
            .collect();
        lines.push(format!("- Distribuição por vaga: {}", parts.join(", ")));
    }
    lines.push(String::new());

    lines.push("### Amostra de linhas".to_string());
    let sample: Vec<Vec<String>> = analytics
        .clean
        .iter()
        .map(|c| vec![c.id.clone(), c.candidato.clone(), c.vaga.clone(), c.data.clone()])
        .collect();
    lines.push(md_table(&["id", "candidato", "vaga", "data"], &sample, 5));
    lines.push(String::new());

    if !analytics.top_terms.is_empty() {
        lines.push("## Top termos (geral)".to_string());
        let all: Vec<&TermCount> = analytics.top_terms.iter().collect();
        lines.push(md_table(&["term", "count"], &term_rows(&all), 15));
        lines.push(String::new());
    }
    grouped_terms(&mut lines, "Top termos por VAGA", &analytics.terms_by_vaga);
    grouped_terms(&mut lines, "Top termos por CANDIDATO", &analytics.terms_by_candidato);

    for (title, grouped) in [
        ("Métricas: média de palavras por VAGA", &analytics.words_by_vaga),
        ("Métricas: média de palavras por CANDIDATO", &analytics.words_by_candidato),
    ] {
        if grouped.rows.is_empty() {
            continue;
        }
        lines.push(format!("## {title}"));
        let rows: Vec<Vec<String>> = grouped
            .rows
            .iter()
            .map(|(key, words)| vec![key.clone(), words.to_string()])
            .collect();
        lines.push(md_table(&[grouped.by.column(), "avg_words"], &rows, 50));
        lines.push(String::new());
    }

    for (title, grouped) in [
        (
            "Scores médios por CANDIDATO (técnico, comunicação, comportamental)",
            &analytics.scores_by_candidato,
        ),
        (
            "Scores médios por VAGA (técnico, comunicação, comportamental)",
            &analytics.scores_by_vaga,
        ),
    ] {
        if grouped.rows.is_empty() {
            continue;
        }
        lines.push(format!("## {title}"));
        let rows: Vec<Vec<String>> = grouped
            .rows
            .iter()
            .map(|(key, s)| {
                vec![
                    key.clone(),
                    s.score_tecnico.to_string(),
                    s.score_comunicacao.to_string(),
                    s.score_comportamental.to_string(),
                ]
            })
            .collect();
        lines.push(md_table(
            &[
                grouped.by.column(),
                "score_tecnico",
                "score_comunicacao",
                "score_comportamental",
            ],
            &rows,
            50,
        ));
        lines.push(String::new());
    }

    if !analytics.scores_by_response.is_empty() {
        lines.push("### Amostra de scores por resposta".to_string());
        let rows: Vec<Vec<String>> = analytics
            .scores_by_response
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.candidato.clone(),
                    r.vaga.clone(),
                    r.score_tecnico.to_string(),
                    r.score_comunicacao.to_string(),
                    r.score_comportamental.to_string(),
                ]
            })
            .collect();
        lines.push(md_table(
            &[
                "id",
                "candidato",
                "vaga",
                "score_tecnico",
                "score_comunicacao",
                "score_comportamental",
            ],
            &rows,
            5,
        ));
        lines.push(String::new());
    }

    for chart in charts {
        lines.push(format!("## {}", chart.heading));
        lines.push(format!("![{}]({})", chart.alt, chart.relative_path));
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::InterviewRecord;
    use chrono::NaiveDate;

    fn record(id: &str, candidato: &str, vaga: &str, resposta: &str) -> InterviewRecord {
        InterviewRecord {
            id: id.to_string(),
            candidato: candidato.to_string(),
            vaga: vaga.to_string(),
            pergunta: String::new(),
            resposta: Some(resposta.to_string()),
            data: "2024-05-01".to_string(),
        }
    }

    #[test]
    fn table_escapes_pipes_and_limits_rows() {
        let rows = vec![
            vec!["a|b".to_string(), "1".to_string()],
            vec!["c".to_string(), "2".to_string()],
        ];
        let table = md_table(&["term", "count"], &rows, 1);
        assert_eq!(table, "| term | count |\n| --- | --- |\n| a\\|b | 1 |");
    }

    #[test]
    fn report_lists_distribution_sections_and_charts() {
        let analytics = InterviewAnalytics::from_records(vec![
            record("1", "Ana", "Dados", "python sql"),
            record("2", "Bruno", "Backend", "docker kubernetes"),
            record("3", "Caio", "Backend", "docker"),
        ]);
        let generated_at = NaiveDate::from_ymd_opt(2024, 5, 2)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .expect("valid timestamp");
        let charts = vec![ChartLink {
            heading: "Visualização: média de palavras por vaga".to_string(),
            alt: "Média de palavras por vaga".to_string(),
            relative_path: "media/avg_words_by_vaga.svg".to_string(),
        }];

        let report = render_report(&analytics, &charts, generated_at);
        assert!(report.starts_with("# Relatório de Análise (baseline)\n_Gerado em 2024-05-02 10:30:00_"));
        assert!(report.contains("- Total de entrevistas: **3**"));
        assert!(report.contains("- Distribuição por vaga: Backend: 2, Dados: 1"));
        assert!(report.contains("## Top termos por VAGA\n### Backend\n| term | count |"));
        assert!(report.contains("![Média de palavras por vaga](media/avg_words_by_vaga.svg)"));
    }
}
