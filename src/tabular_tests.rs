// src/tabular_tests.rs

#[cfg(test)]
mod tests {
    use crate::tabular::*;
    use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

    fn text_upload(text: &str) -> Upload {
        Upload {
            file_name: None,
            content_base64: None,
            text: Some(text.to_string()),
        }
    }

    fn file_upload(name: &str, bytes: &[u8]) -> Upload {
        Upload {
            file_name: Some(name.to_string()),
            content_base64: Some(BASE64_STANDARD.encode(bytes)),
            text: None,
        }
    }

    #[test]
    fn test_decode_pasted_csv() {
        let table = decode_upload(&text_upload(
            "First Name,Email\nAda,ada@example.com\nGrace,grace@example.com",
        ))
        .expect("pasted CSV should decode");

        assert_eq!(table.headers, vec!["First Name", "Email"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("First Name"), Some("Ada"));
        assert_eq!(table.rows[1].get("Email"), Some("grace@example.com"));
    }

    #[test]
    fn test_decode_csv_file() {
        let upload = file_upload("roster.CSV", b"Name,Phone\nAcme,123\n");
        let table = decode_upload(&upload).expect("CSV file should decode");

        assert_eq!(table.headers, vec!["Name", "Phone"]);
        assert_eq!(table.rows[0].get("Phone"), Some("123"));
    }

    #[test]
    fn test_blank_lines_and_blank_cells_are_skipped() {
        let table = decode_upload(&text_upload("Name,Phone\n,\nAcme,\n\nBeta,456\n"))
            .expect("CSV should decode");

        // The all-blank row disappears entirely; blank cells are simply
        // absent from their record.
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Name"), Some("Acme"));
        assert_eq!(table.rows[0].get("Phone"), None);
        assert_eq!(table.rows[1].get("Phone"), Some("456"));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let table =
            decode_upload(&text_upload("Name,Phone,Notes\nAcme,123\n")).expect("CSV should decode");

        assert_eq!(table.rows[0].get("Name"), Some("Acme"));
        assert_eq!(table.rows[0].get("Notes"), None);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let table =
            decode_upload(&text_upload(" Name , Phone \nAcme,123\n")).expect("CSV should decode");
        assert_eq!(table.headers, vec!["Name", "Phone"]);
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let err = decode_upload(&text_upload("Name,Phone\n")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "File must contain at least a header row and one data row."
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = decode_upload(&file_upload("roster.pdf", b"whatever")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type. Please upload a CSV or Excel file."
        );
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let upload = Upload {
            file_name: None,
            content_base64: None,
            text: Some("   ".to_string()),
        };
        assert!(matches!(
            decode_upload(&upload).unwrap_err(),
            DecodeError::EmptyUpload
        ));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let upload = Upload {
            file_name: Some("roster.csv".to_string()),
            content_base64: Some("not base64!!!".to_string()),
            text: None,
        };
        assert!(matches!(
            decode_upload(&upload).unwrap_err(),
            DecodeError::Content(_)
        ));
    }

    #[test]
    fn test_pasted_text_wins_over_file() {
        let mut upload = file_upload("roster.csv", b"Name\nFromFile\n");
        upload.text = Some("Name\nFromText\n".to_string());

        let table = decode_upload(&upload).expect("upload should decode");
        assert_eq!(table.rows[0].get("Name"), Some("FromText"));
    }
}
