// src/model_tests.rs

#[cfg(test)]
mod tests {
    use crate::model::*;
    use chrono::Weekday;

    #[test]
    fn test_weekday_mask_round_trip() {
        for mask in ["1111100", "0000000", "1111111", "0101010", "1000001"] {
            let days = days_from_mask(mask).expect("well-formed mask should decode");
            assert_eq!(mask_from_days(&days), mask);
        }
    }

    #[test]
    fn test_weekday_mask_monday_to_friday() {
        let days = days_from_mask("1111100").expect("mask should decode");
        assert_eq!(
            days,
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]
        );
    }

    #[test]
    fn test_weekday_mask_rejects_malformed_input() {
        assert_eq!(days_from_mask("111110X"), None);
        assert_eq!(days_from_mask("11111"), None);
        assert_eq!(days_from_mask("11111001"), None);
        assert_eq!(days_from_mask(""), None);
    }
}
