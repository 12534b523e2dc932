//! Compound attribute filter, evaluated cheapest-first with short-circuit
//! semantics. A rejection is never an error the caller has to handle — the
//! executor treats `FilterRejected` as "drop this candidate".

use crate::edtf_lite::{self, EdtfDate};
use crate::error::CoreError;
use crate::model::{ExistentialFlag, Spr};
use std::collections::HashSet;

/// `geometries` dimension: which geometry variants a query accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryScope {
    #[default]
    All,
    Default,
    Alt,
}

/// A compound predicate over an SPR. Every dimension is optional; an empty
/// set or `None` passes everything for that dimension.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub placetypes: HashSet<String>,
    pub geometries: GeometryScope,
    pub alternate_geometries: HashSet<String>,
    pub is_current: HashSet<i64>,
    pub is_ceased: HashSet<i64>,
    pub is_deprecated: HashSet<i64>,
    pub is_superseded: HashSet<i64>,
    pub is_superseding: HashSet<i64>,
    pub inception_date: Option<EdtfDate>,
    pub cessation_date: Option<EdtfDate>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    /// Parses and stores an EDTF-lite `inception_date` lower bound.
    pub fn with_inception_date(mut self, text: &str) -> Result<Self, CoreError> {
        self.inception_date = Some(
            edtf_lite::parse(text).map_err(CoreError::Config)?,
        );
        Ok(self)
    }

    /// Parses and stores an EDTF-lite `cessation_date` upper bound.
    pub fn with_cessation_date(mut self, text: &str) -> Result<Self, CoreError> {
        self.cessation_date = Some(
            edtf_lite::parse(text).map_err(CoreError::Config)?,
        );
        Ok(self)
    }

    /// Evaluates the filter against `spr`, short-circuiting cheapest-first:
    /// existential flags, placetype, alt-geometry scope, then dates.
    ///
    /// Returns `Ok(())` on pass, `Err(CoreError::FilterRejected(reason))` on
    /// the first failing dimension.
    pub fn evaluate(&self, spr: &Spr) -> Result<(), CoreError> {
        self.check_flag_set(&self.is_current, spr.is_current, "is_current")?;
        self.check_flag_set(&self.is_ceased, spr.is_ceased, "is_ceased")?;
        self.check_flag_set(&self.is_deprecated, spr.is_deprecated, "is_deprecated")?;
        self.check_flag_set(&self.is_superseded, spr.is_superseded, "is_superseded")?;
        self.check_flag_set(&self.is_superseding, spr.is_superseding, "is_superseding")?;

        if !self.placetypes.is_empty() && !self.placetypes.contains(&spr.placetype) {
            return Err(CoreError::FilterRejected(format!(
                "placetype {:?} not in allowed set",
                spr.placetype
            )));
        }

        self.check_geometry_scope(spr)?;

        if let Some(min) = self.inception_date {
            self.check_date_lower_bound(spr.inception.as_deref(), min)?;
        }
        if let Some(max) = self.cessation_date {
            self.check_date_upper_bound(spr.cessation.as_deref(), max)?;
        }

        Ok(())
    }

    fn check_flag_set(
        &self,
        allowed: &HashSet<i64>,
        value: ExistentialFlag,
        name: &str,
    ) -> Result<(), CoreError> {
        if allowed.is_empty() || allowed.contains(&value.as_i64()) {
            Ok(())
        } else {
            Err(CoreError::FilterRejected(format!("{name} value {:?} excluded", value.as_i64())))
        }
    }

    fn check_geometry_scope(&self, spr: &Spr) -> Result<(), CoreError> {
        let is_alt = !spr.alt_label.is_empty();
        match self.geometries {
            GeometryScope::All => {}
            GeometryScope::Default if is_alt => {
                return Err(CoreError::FilterRejected("alt geometry excluded by scope=default".into()));
            }
            GeometryScope::Alt if !is_alt => {
                return Err(CoreError::FilterRejected("canonical geometry excluded by scope=alt".into()));
            }
            _ => {}
        }
        if !self.alternate_geometries.is_empty() {
            if !is_alt || !self.alternate_geometries.contains(&spr.alt_label) {
                return Err(CoreError::FilterRejected(format!(
                    "alt_label {:?} not in allowed set",
                    spr.alt_label
                )));
            }
        }
        Ok(())
    }

    fn check_date_lower_bound(&self, candidate: Option<&str>, min: EdtfDate) -> Result<(), CoreError> {
        match candidate {
            None => Err(CoreError::FilterRejected("inception date absent, filter requires one".into())),
            Some(text) => {
                let value = edtf_lite::parse(text).map_err(CoreError::FilterRejected)?;
                if value >= min {
                    Ok(())
                } else {
                    Err(CoreError::FilterRejected("inception date before filter minimum".into()))
                }
            }
        }
    }

    fn check_date_upper_bound(&self, candidate: Option<&str>, max: EdtfDate) -> Result<(), CoreError> {
        match candidate {
            None => Err(CoreError::FilterRejected("cessation date absent, filter requires one".into())),
            Some(text) => {
                let value = edtf_lite::parse(text).map_err(CoreError::FilterRejected)?;
                if value <= max {
                    Ok(())
                } else {
                    Err(CoreError::FilterRejected("cessation date after filter maximum".into()))
                }
            }
        }
    }
}
