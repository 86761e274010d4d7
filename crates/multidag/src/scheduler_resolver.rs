//! Resolving multi-workload schedulers from strings like `GlobalList[order=low]`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::multi_scheduler::MultiScheduler;
use crate::multi_schedulers::global_list::{GlobalListScheduler, RankOrder};
use crate::multi_schedulers::min_lowerbound::MinLowerboundScheduler;

/// Scheduler name with its `key=value` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerParams {
    name: String,
    options: BTreeMap<String, String>,
}

impl FromStr for SchedulerParams {
    type Err = Error;

    /// Accepts `Name` or `Name[key=value,...]`, keys must be non-empty and unique.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSchedulerParams(s.to_string());
        let (name, options) = match s.split_once('[') {
            None => (s, None),
            Some((name, rest)) => (name, Some(rest.strip_suffix(']').ok_or_else(invalid)?)),
        };
        let name = name.trim();
        if name.is_empty() || name.contains(']') {
            return Err(invalid());
        }

        let mut parsed = BTreeMap::new();
        for option in options.into_iter().flat_map(|options| options.split(',')) {
            let (key, value) = option.split_once('=').ok_or_else(invalid)?;
            let key = key.trim();
            if key.is_empty() || parsed.insert(key.to_string(), value.trim().to_string()).is_some() {
                return Err(invalid());
            }
        }

        Ok(Self {
            name: name.to_string(),
            options: parsed,
        })
    }
}

impl SchedulerParams {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed value of option `key`, `Ok(None)` if it is not given.
    pub fn get<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.options
            .get(key)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|_| Error::InvalidSchedulerParams(format!("{key}={value}")))
            })
            .transpose()
    }
}

impl fmt::Display for SchedulerParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.options.is_empty() {
            let options = self
                .options
                .iter()
                .format_with(",", |(key, value), f| f(&format_args!("{key}={value}")));
            write!(f, "[{options}]")?;
        }
        Ok(())
    }
}

pub type SchedulerResolver = fn(&SchedulerParams) -> Result<Box<dyn MultiScheduler>>;

/// Knows `MinLowerbound`, `GlobalList[order=high|low]` and the aliases `Fdws` and `RankHybrid`.
pub fn default_scheduler_resolver(params: &SchedulerParams) -> Result<Box<dyn MultiScheduler>> {
    let scheduler: Box<dyn MultiScheduler> = match params.name() {
        "MinLowerbound" => Box::new(MinLowerboundScheduler::new()),
        "GlobalList" => Box::new(GlobalListScheduler::from_params(params)?),
        "Fdws" => Box::new(GlobalListScheduler::new(RankOrder::High)),
        "RankHybrid" => Box::new(GlobalListScheduler::new(RankOrder::Low)),
        _ => return Err(Error::InvalidSchedulerParams(params.to_string())),
    };
    Ok(scheduler)
}

/// Parses scheduler string and resolves it with `resolver`.
pub fn resolve_scheduler(s: &str, resolver: SchedulerResolver) -> Result<Box<dyn MultiScheduler>> {
    resolver(&s.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<SchedulerParams> {
        s.parse()
    }

    #[test]
    fn parse_and_display() {
        let params = parse("GlobalList[order=low, x=1]").unwrap();
        assert_eq!(params.name(), "GlobalList");
        assert_eq!(params.get::<String>("order").unwrap().as_deref(), Some("low"));
        assert_eq!(params.get::<u32>("x").unwrap(), Some(1));
        assert_eq!(params.get::<u32>("y").unwrap(), None);
        assert!(matches!(params.get::<u32>("order"), Err(Error::InvalidSchedulerParams(_))));
        assert_eq!(params.to_string(), "GlobalList[order=low,x=1]");
        assert_eq!(parse("Fdws").unwrap().to_string(), "Fdws");
    }

    #[test]
    fn malformed_strings() {
        for s in [
            "GlobalList[order=low",
            "GlobalList[order]",
            "GlobalList[]",
            "GlobalList[=low]",
            "GlobalList[order=low,order=high]",
            "[order=low]",
            "",
        ] {
            assert!(matches!(parse(s), Err(Error::InvalidSchedulerParams(_))), "{s}");
        }
    }

    #[test]
    fn resolve() {
        for name in ["MinLowerbound", "GlobalList[order=high]", "GlobalList[order=low]", "Fdws", "RankHybrid"] {
            assert!(resolve_scheduler(name, default_scheduler_resolver).is_ok(), "{name}");
        }
        assert!(matches!(
            resolve_scheduler("Heft", default_scheduler_resolver),
            Err(Error::InvalidSchedulerParams(_))
        ));
        assert!(matches!(
            resolve_scheduler("GlobalList[order=up]", default_scheduler_resolver),
            Err(Error::InvalidSchedulerParams(s)) if s == "order=up"
        ));
    }
}
