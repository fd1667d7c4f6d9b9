use {
    ascii_table::AsciiTable,
    kanabun::validate::{LineReport, LineStatus, ValidationReport},
};

pub fn print_report(report: &ValidationReport) {
    let mut table = AsciiTable::default();
    table.column(0).set_header("Line");
    table.column(1).set_header("Label");
    table.column(2).set_header("Status");
    table.column(3).set_header("Morae");
    table.column(4).set_header("Text");

    let data = report.lines.iter().map(row).collect::<Vec<_>>();
    table.print(&data);

    for line in report.mismatches() {
        if let LineStatus::Mismatch {
            original_markup: Some(markup),
            ..
        } = &line.status
        {
            println!();
            println!("--- {} (original) ---", line.label);
            println!("{markup}");
        }
    }

    let total = report.lines.len();
    let mismatched = report.mismatches().count();
    let malformed = report.structural_errors().count();
    println!();
    println!(
        "{} valid, {mismatched} mismatched, {malformed} malformed",
        total - mismatched - malformed
    );
}

fn row(line: &LineReport) -> Vec<String> {
    let (status, morae, text) = match &line.status {
        LineStatus::Valid { counts } => {
            ("✔".to_owned(), format_counts(counts, &[]), String::new())
        }
        LineStatus::Mismatch {
            counts,
            diverging,
            segments,
            ..
        } => (
            "mismatch".to_owned(),
            format_counts(counts, diverging),
            segments.join(" / "),
        ),
        LineStatus::StructuralError {
            segment_count,
            text,
        } => (
            format!("{segment_count} segments"),
            String::new(),
            text.trim().to_owned(),
        ),
    };
    vec![
        line.source_line.to_string(),
        line.label.clone(),
        status,
        morae,
        text,
    ]
}

/// Writes counts like `5-7-[4]-7-7`, bracketing the diverging ones.
fn format_counts(counts: &[usize], diverging: &[usize]) -> String {
    counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            if diverging.contains(&index) {
                format!("[{count}]")
            } else {
                count.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(format_counts(&[5, 7, 5, 7, 7], &[]), "5-7-5-7-7");
        assert_eq!(format_counts(&[5, 6, 5, 7, 8], &[1, 4]), "5-[6]-5-7-[8]");
    }

    fn report(status: LineStatus) -> LineReport {
        LineReport {
            label: "L1".into(),
            identity: Some("L1".into()),
            ordinal: None,
            position: 0,
            source_line: 12,
            aligned: None,
            status,
        }
    }

    #[test]
    fn rows() {
        let valid = report(LineStatus::Valid {
            counts: [5, 7, 5, 7, 7],
        });
        assert_eq!(row(&valid), ["12", "L1", "✔", "5-7-5-7-7", ""]);

        let mismatch = report(LineStatus::Mismatch {
            counts: [5, 7, 5, 7, 8],
            diverging: vec![4],
            segments: vec!["あ".into(), "い".into()],
            original_markup: None,
        });
        assert_eq!(
            row(&mismatch),
            ["12", "L1", "mismatch", "5-7-5-7-[8]", "あ / い"]
        );

        let malformed = report(LineStatus::StructuralError {
            segment_count: 4,
            text: " はる ".into(),
        });
        assert_eq!(row(&malformed), ["12", "L1", "4 segments", "", "はる"]);
    }
}
