//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use crate::model::{Service, ServiceState, BYTES_PER_MB};
use crate::reconcile::DeleteReport;

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Left-aligned columns separated by three spaces, headers upper-cased
///
/// Cells past the last header are appended unpadded.
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    let header_row: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(String::len)
                .fold(header_row[col].len(), usize::max)
        })
        .collect();

    let render = |cells: &[String]| -> String {
        let line = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| match widths.get(col) {
                Some(&width) => format!("{:<width$}", cell),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join("   ");
        format!("{}\n", line.trim_end())
    };

    std::iter::once(&header_row)
        .chain(rows.iter())
        .map(|cells| render(cells.as_slice()))
        .collect()
}

fn format_memory_mb(mb: u64) -> String {
    if mb == 0 {
        "-".to_string()
    } else {
        format!("{}M", mb)
    }
}

// ============================================================================
// Service display
// ============================================================================

/// Declared services: what was asked for
pub fn format_service_list(services: &[Service]) -> String {
    let headers = &["ID", "NAME", "IMAGE", "REPLICAS", "MEMORY"];
    let rows: Vec<Vec<String>> = services
        .iter()
        .map(|s| {
            vec![
                s.id.clone().unwrap_or_default(),
                s.name.clone(),
                s.image.clone(),
                s.replicas.to_string(),
                format_memory_mb(s.memory_limit),
            ]
        })
        .collect();

    format_table(headers, rows)
}

/// Observed service state: running against required replicas
pub fn format_state_list(states: &[ServiceState]) -> String {
    let headers = &["ID", "NAME", "IMAGE", "RUNNING", "MEMORY", "STATUS"];
    let rows: Vec<Vec<String>> = states
        .iter()
        .map(|s| {
            let status = if s.is_converged() {
                "Converged"
            } else if s.replicas_running < s.replicas_required {
                "Degraded"
            } else {
                "Scaling"
            };

            vec![
                s.id.clone(),
                s.name.clone(),
                s.image.clone(),
                format!("{}/{}", s.replicas_running, s.replicas_required),
                format_memory_mb(s.memory_limit_bytes.div_ceil(BYTES_PER_MB)),
                status.to_string(),
            ]
        })
        .collect();

    format_table(headers, rows)
}

pub fn format_delete_report(report: &DeleteReport) -> String {
    let mut output = String::new();
    for name in &report.removed {
        output.push_str(&format!("service/{} deleted\n", name));
    }
    for name in &report.skipped {
        output.push_str(&format!("service/{} not found\n", name));
    }
    if output.is_empty() {
        output.push_str("Nothing to delete.\n");
    }
    output
}
