//! Envelope and restore result formatting

use crate::envelope::{EnvelopeInfo, RestoreReport, HEADER_LEN};

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Describe an envelope's framing
pub fn format_envelope_info(info: &EnvelopeInfo) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Size:       {} ({} bytes)\n",
        format_size(info.total_len as u64),
        info.total_len
    ));
    output.push_str(&format!("Salt:       {}\n", info.salt_b64));
    output.push_str(&format!("Nonce:      {}\n", info.nonce_b64));
    output.push_str(&format!(
        "Ciphertext: {} bytes after the {}-byte header (tag included)\n",
        info.ciphertext_len, HEADER_LEN
    ));
    output.push_str(&format!("Payload:    {} bytes\n", info.payload_len));
    output.push_str("Cipher:     AES-256-GCM, key from PBKDF2-HMAC-SHA256\n");
    output
}

/// Describe a finished restore
pub fn format_restore_report(report: &RestoreReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", report.summary()));
    output.push_str(&format!(
        "  From:     \"{}\" (exported {})\n",
        report.manifest.name, report.manifest.exported_at
    ));
    if report.dropped > 0 {
        output.push_str(&format!(
            "  Skipped:  {} incomplete {}\n",
            report.dropped,
            report.kind.noun(report.dropped)
        ));
    }
    output
}
