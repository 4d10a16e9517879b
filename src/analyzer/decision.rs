use crate::analyzer::criteria::{CriteriaSet, Criterion};
use crate::analyzer::fields::{FIELDS, Field};
use crate::model::CanonicalOffer;

/// Outcome of one field: `overall` is always `matches && exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionResult {
    /// The inclusion predicate holds (true when none was requested).
    pub matches: bool,
    /// The offer is not excluded (true when no exclusion was requested).
    pub exclude: bool,
    pub overall: bool,
}

impl CriterionResult {
    pub fn new(matches: bool, exclude: bool) -> Self {
        Self {
            matches,
            exclude,
            overall: matches && exclude,
        }
    }
}

impl Default for CriterionResult {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[derive(Debug, Clone)]
pub struct FieldOutcome<'a> {
    pub field: Field,
    pub match_criterion: Option<&'a Criterion>,
    pub exclude_criterion: Option<&'a Criterion>,
    pub result: CriterionResult,
}

/// One offer joined with its per-field results for the duration of one decision.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub offer: &'a CanonicalOffer,
    outcomes: Vec<FieldOutcome<'a>>,
}

impl<'a> EvaluationContext<'a> {
    /// Per-field outcomes in registry order.
    pub fn outcomes(&self) -> &[FieldOutcome<'a>] {
        &self.outcomes
    }

    #[cfg(test)]
    pub fn result(&self, field: Field) -> Option<CriterionResult> {
        self.outcomes
            .iter()
            .find(|o| o.field == field)
            .map(|o| o.result)
    }

    /// AND over every field's overall value.
    pub fn admitted(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.overall)
    }

    /// Names of the fields that vetoed the offer.
    pub fn failed_fields(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| !o.result.overall)
            .map(|o| o.field.name())
            .collect()
    }
}

/// Evaluates every registered field of `offer` against `criteria`.
pub fn evaluate<'a>(
    offer: &'a CanonicalOffer,
    criteria: &'a CriteriaSet,
) -> (bool, EvaluationContext<'a>) {
    let outcomes: Vec<FieldOutcome<'a>> = FIELDS
        .iter()
        .map(|&(field, _)| {
            let match_criterion = criteria.match_criterion(field);
            let exclude_criterion = criteria.exclude_criterion(field);

            let mut matches = match_criterion.is_none_or(|c| c.holds(field, offer));
            let exclude = exclude_criterion.is_none_or(|c| !c.holds(field, offer));
            if !exclude && field.exclusion_dominates() {
                matches = false;
            }

            FieldOutcome {
                field,
                match_criterion,
                exclude_criterion,
                result: CriterionResult::new(matches, exclude),
            }
        })
        .collect();

    let context = EvaluationContext { offer, outcomes };
    (context.admitted(), context)
}
