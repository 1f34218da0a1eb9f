use std::fmt;
use std::str::FromStr;

use super::error::NotaError;

/// Number of digits in a complete access key.
pub const KEY_LEN: usize = 44;

/// Number of digits the check-digit computation runs over.
pub const KEY_BODY_LEN: usize = 43;

/// A 44-digit NF-e access key, split into its positional fields.
///
/// Layout (0-indexed): state code (0–1), year-month YYMM (2–5), issuer tax id
/// zero-padded to 14 digits (6–19), document model (20–21), series (22–24),
/// document number (25–33), emission type (34), random code (35–42), check
/// digit (43). Parsing and rendering go through this struct so no other code
/// has to slice keys by magic offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessKey {
    /// IBGE state code of the issuer (2 digits).
    pub state_code: String,
    /// Emission year and month, `YYMM` (4 digits).
    pub year_month: String,
    /// Issuer CNPJ, zero-padded to 14 digits.
    pub tax_id: String,
    /// Document model, e.g. "55" for NF-e (2 digits).
    pub model: String,
    /// Document series (3 digits).
    pub series: String,
    /// Document number, zero-padded to 9 digits.
    pub number: String,
    /// Emission type (1 digit). Always copied verbatim on rewrite.
    pub emission_type: String,
    /// Random anti-guessing code (8 digits). Always copied verbatim.
    pub random_code: String,
    /// Mod-11 check digit (1 digit).
    pub check_digit: char,
}

/// Requested substitutions for deriving a replacement key.
///
/// `None` fields keep the original segment. Everything outside the year-month
/// and tax-id segments is copied verbatim; the check digit is always
/// recomputed over the resulting 43-digit body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRewrite {
    /// Replacement issuer tax id; left-padded with zeros to 14 digits.
    pub new_tax_id: Option<String>,
    /// Replacement `YYMM` emission year-month.
    pub new_year_month: Option<String>,
}

impl KeyRewrite {
    /// True when neither segment is replaced (rewrite is the identity).
    pub fn is_noop(&self) -> bool {
        self.new_tax_id.is_none() && self.new_year_month.is_none()
    }
}

/// Compute the mod-11 check digit over a 43-digit key body.
///
/// Digits are weighted from least-significant to most-significant with the
/// cyclic sequence 2,3,4,5,6,7,8,9,2,3,… and summed; with
/// `dv = 11 - (sum % 11)`, any `dv` in {0, 1, 10, 11} yields `'0'`, otherwise
/// the digit itself. The {0,1,10,11} mapping conflates remainder-driven and
/// literal-digit cases but matches the published national algorithm exactly
/// and must not be simplified.
pub fn check_digit(body: &str) -> Result<char, NotaError> {
    if body.len() != KEY_BODY_LEN {
        return Err(NotaError::InvalidKeyLength {
            expected: KEY_BODY_LEN,
            actual: body.len(),
        });
    }

    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for ch in body.chars().rev() {
        let digit = ch
            .to_digit(10)
            .ok_or(NotaError::InvalidKeyDigit(ch))?;
        sum += digit * weight;
        weight += 1;
        if weight > 9 {
            weight = 2;
        }
    }

    let dv = 11 - (sum % 11);
    Ok(match dv {
        0 | 1 | 10 | 11 => '0',
        d => char::from_digit(d, 10).unwrap_or('0'),
    })
}

impl AccessKey {
    /// Render the 43-digit body (everything except the check digit).
    pub fn body(&self) -> String {
        format!(
            "{}{}{}{}{}{}{}{}",
            self.state_code,
            self.year_month,
            self.tax_id,
            self.model,
            self.series,
            self.number,
            self.emission_type,
            self.random_code
        )
    }

    /// Document number with leading zeros stripped, as used in file names.
    pub fn short_number(&self) -> &str {
        self.number.trim_start_matches('0')
    }

    /// Derive a replacement key, recomputing the check digit.
    ///
    /// The state code, model, series, number, emission type, and random code
    /// are copied unchanged. A new tax id is reduced to its digits and
    /// left-padded with zeros to 14 characters.
    pub fn rewrite(&self, rewrite: &KeyRewrite) -> Result<AccessKey, NotaError> {
        let tax_id = match &rewrite.new_tax_id {
            Some(raw) => {
                let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
                format!("{digits:0>14}")
            }
            None => self.tax_id.clone(),
        };
        let year_month = rewrite
            .new_year_month
            .clone()
            .unwrap_or_else(|| self.year_month.clone());

        let mut new_key = AccessKey {
            year_month,
            tax_id,
            ..self.clone()
        };
        new_key.check_digit = check_digit(&new_key.body())?;
        Ok(new_key)
    }
}

impl FromStr for AccessKey {
    type Err = NotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != KEY_LEN {
            return Err(NotaError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: s.len(),
            });
        }
        if let Some(ch) = s.chars().find(|c| !c.is_ascii_digit()) {
            return Err(NotaError::InvalidKeyDigit(ch));
        }
        Ok(AccessKey {
            state_code: s[0..2].to_string(),
            year_month: s[2..6].to_string(),
            tax_id: s[6..20].to_string(),
            model: s[20..22].to_string(),
            series: s[22..25].to_string(),
            number: s[25..34].to_string(),
            emission_type: s[34..35].to_string(),
            random_code: s[35..43].to_string(),
            check_digit: s.chars().nth(43).unwrap_or('0'),
        })
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.body(), self.check_digit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 43-digit body with a known check digit.
    const BODY: &str = "3524061122233300018155001000012345100001234";

    fn sample_key() -> String {
        let dv = check_digit(BODY).unwrap();
        format!("{BODY}{dv}")
    }

    #[test]
    fn check_digit_rejects_wrong_length() {
        assert!(matches!(
            check_digit("123"),
            Err(NotaError::InvalidKeyLength {
                expected: 43,
                actual: 3
            })
        ));
    }

    #[test]
    fn check_digit_rejects_non_digits() {
        let body = format!("{}X", &BODY[..42]);
        assert!(matches!(
            check_digit(&body),
            Err(NotaError::InvalidKeyDigit('X'))
        ));
    }

    #[test]
    fn check_digit_known_values() {
        // All zeros: sum = 0, remainder 0, dv 11 -> '0'
        assert_eq!(check_digit(&"0".repeat(43)).unwrap(), '0');
        // Single trailing 1 weighted by 2: sum = 2, dv = 9
        let body = format!("{}1", "0".repeat(42));
        assert_eq!(check_digit(&body).unwrap(), '9');
        // Single trailing 5 weighted by 2: sum = 10, dv = 1 -> '0'
        let body = format!("{}5", "0".repeat(42));
        assert_eq!(check_digit(&body).unwrap(), '0');
    }

    #[test]
    fn parse_and_render_roundtrip() {
        let raw = sample_key();
        let key: AccessKey = raw.parse().unwrap();
        assert_eq!(key.state_code, "35");
        assert_eq!(key.year_month, "2406");
        assert_eq!(key.tax_id, "11222333000181");
        assert_eq!(key.model, "55");
        assert_eq!(key.series, "001");
        assert_eq!(key.number, "000012345");
        assert_eq!(key.emission_type, "1");
        assert_eq!(key.random_code, "00001234");
        assert_eq!(key.to_string(), raw);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("123".parse::<AccessKey>().is_err());
        let raw = format!("{}Z", &sample_key()[..43]);
        assert!(raw.parse::<AccessKey>().is_err());
    }

    #[test]
    fn rewrite_noop_is_identity() {
        let key: AccessKey = sample_key().parse().unwrap();
        let out = key.rewrite(&KeyRewrite::default()).unwrap();
        assert_eq!(out, key);
    }

    #[test]
    fn rewrite_substitutes_tax_id() {
        let key: AccessKey = sample_key().parse().unwrap();
        let out = key
            .rewrite(&KeyRewrite {
                new_tax_id: Some("12.345.678/0001-95".into()),
                new_year_month: None,
            })
            .unwrap();
        assert_eq!(out.tax_id, "12345678000195");
        assert_eq!(out.state_code, key.state_code);
        assert_eq!(out.year_month, key.year_month);
        assert_eq!(out.number, key.number);
        assert_eq!(out.random_code, key.random_code);
        assert_eq!(out.check_digit, check_digit(&out.body()).unwrap());
    }

    #[test]
    fn rewrite_pads_short_tax_id() {
        let key: AccessKey = sample_key().parse().unwrap();
        let out = key
            .rewrite(&KeyRewrite {
                new_tax_id: Some("123".into()),
                new_year_month: None,
            })
            .unwrap();
        assert_eq!(out.tax_id, "00000000000123");
        assert_eq!(out.to_string().len(), KEY_LEN);
    }

    #[test]
    fn rewrite_substitutes_year_month() {
        let key: AccessKey = sample_key().parse().unwrap();
        let out = key
            .rewrite(&KeyRewrite {
                new_tax_id: None,
                new_year_month: Some("2501".into()),
            })
            .unwrap();
        assert_eq!(out.year_month, "2501");
        assert_eq!(out.tax_id, key.tax_id);
        assert_eq!(&out.to_string()[2..6], "2501");
    }

    #[test]
    fn short_number_strips_leading_zeros() {
        let key: AccessKey = sample_key().parse().unwrap();
        assert_eq!(key.short_number(), "12345");
    }
}
