//! Text form of one persisted sample: `[p0,...,p18],[s0,...,sK]`.

use std::{fmt, str::FromStr};

use crate::{
    error::{ParamError, RecordError},
    params::PARAM_COUNT,
};

#[derive(Clone, Debug, PartialEq)]
pub struct SampleRecord {
    pub params: [f32; PARAM_COUNT],
    pub statistics: Vec<f32>,
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.params)?;
        f.write_str(",")?;
        write_list(f, &self.statistics)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[f32]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{v}")?;
    }
    f.write_str("]")
}

impl FromStr for SampleRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (params, rest) = take_list(s.trim())?;
        let rest = rest
            .trim_start()
            .strip_prefix(',')
            .ok_or(RecordError::MissingList)?;
        let (statistics, rest) = take_list(rest.trim_start())?;
        if !rest.trim().is_empty() {
            return Err(RecordError::TrailingInput(rest.trim().to_owned()));
        }

        let params: [f32; PARAM_COUNT] =
            params
                .as_slice()
                .try_into()
                .map_err(|_| ParamError::WrongLength {
                    expected: PARAM_COUNT,
                    actual: params.len(),
                })?;
        Ok(Self { params, statistics })
    }
}

/// Parses a leading `[a,b,...]` and returns the values and the remainder.
fn take_list(s: &str) -> Result<(Vec<f32>, &str), RecordError> {
    let body = s.strip_prefix('[').ok_or(RecordError::MissingList)?;
    let end = body.find(']').ok_or(RecordError::MissingList)?;
    let (inner, rest) = (&body[..end], &body[end + 1..]);

    let values = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(|t| {
                let t = t.trim();
                t.parse::<f32>()
                    .map_err(|_| RecordError::InvalidNumber(t.to_owned()))
            })
            .collect::<Result<_, _>>()?
    };
    Ok((values, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{params::TreeParameters, stats::StatisticsKind, tree::TreeModel};

    #[test]
    fn formats_bracketed_lists() {
        let record = SampleRecord {
            params: TreeParameters::default().to_vector(),
            statistics: vec![12.5, 3.0],
        };

        assert_eq!(
            record.to_string(),
            "[7,0.15,0,0,1,0.3,0,20,0.2,20,4,20,60,0.5,10,4,20,35,0.5],[12.5,3]"
        );
    }

    #[test]
    fn parses_generated_record_back() {
        let mut model = TreeModel::default();
        model.generate();
        let record = SampleRecord {
            params: model.params_vector(),
            statistics: model.statistics_vector(StatisticsKind::Histograms),
        };

        let parsed: SampleRecord = record.to_string().parse().unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn tolerates_whitespace() {
        let line = " [7, 0.15,0,0,1,0.3,0,20,0.2,20,4,20,60,0.5,10,4,20,35,0.5] , [ 1.5 ]\n";
        let record: SampleRecord = line.parse().unwrap();

        assert_eq!(record.params[1], 0.15);
        assert_eq!(record.statistics, vec![1.5]);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!("7,0.15".parse::<SampleRecord>(), Err(RecordError::MissingList));
        assert_eq!(
            "[1,2],[3]".parse::<SampleRecord>(),
            Err(RecordError::Params(ParamError::WrongLength {
                expected: 19,
                actual: 2
            }))
        );
        assert_eq!(
            "[1,x],[3]".parse::<SampleRecord>(),
            Err(RecordError::InvalidNumber("x".to_owned()))
        );
        assert!(matches!(
            "[1],[3]tail".parse::<SampleRecord>(),
            Err(RecordError::TrailingInput(_))
        ));
    }
}
