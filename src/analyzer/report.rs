use crate::analyzer::decision::EvaluationContext;

const HEADER: [&str; 7] = [
    "Property",
    "Value",
    "Match Criteria",
    "Exclusion Criteria",
    "Match",
    "Exclude",
    "Overall",
];

/// Renders the per-field table of an evaluation, followed by the offer's URL.
pub fn render_report(ctx: &EvaluationContext<'_>) -> String {
    let rows: Vec<[String; 7]> = ctx
        .outcomes()
        .iter()
        .map(|o| {
            [
                o.field.name().to_string(),
                o.field.value(ctx.offer).to_string(),
                o.match_criterion.map(ToString::to_string).unwrap_or_default(),
                o.exclude_criterion.map(ToString::to_string).unwrap_or_default(),
                o.result.matches.to_string(),
                o.result.exclude.to_string(),
                o.result.overall.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let rule = format!("+{rule}+");

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format_row(&HEADER.map(String::from), &widths));
    out.push_str(&rule.replace('-', "="));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Server URL: {}\n", ctx.offer.url()));

    out.lines()
        .map(|line| format!("\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row(cells: &[String; 7], widths: &[usize; 7]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!(" {cell:<width$} "))
        .collect();
    format!("|{}|\n", cells.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::criteria::{CriteriaSet, Criterion};
    use crate::analyzer::decision::evaluate;
    use crate::analyzer::fields::{FIELDS, Field};
    use crate::normalizer::normalize;
    use serde_json::json;

    #[test]
    fn test_report_lists_every_field() {
        let offer = normalize(&json!({"id": 7, "price": 50, "ram_size": 64}), 19.0).unwrap();
        let mut criteria = CriteriaSet::new();
        criteria.set_match(Field::RamSize, Criterion::AtLeast(32)).unwrap();
        let (_, ctx) = evaluate(&offer, &criteria);

        let report = render_report(&ctx);
        for (_, name) in FIELDS {
            assert!(report.contains(name), "missing {name}");
        }
        assert!(report.contains(">= 32"));
        assert!(report.contains("59.50"));
        assert!(report.ends_with("Server URL: https://www.hetzner.com/sb/#search=7"));
        assert!(report.lines().all(|line| line.starts_with('\t')));
    }

    #[test]
    fn test_report_rows_are_aligned() {
        let offer = normalize(&json!({"id": 1, "cpu": "Intel Xeon E3-1275v6"}), 0.0).unwrap();
        let criteria = CriteriaSet::new();
        let (_, ctx) = evaluate(&offer, &criteria);

        let report = render_report(&ctx);
        let widths: Vec<usize> = report
            .lines()
            .filter(|line| line.starts_with("\t|") || line.starts_with("\t+"))
            .map(|line| line.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
