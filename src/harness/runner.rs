use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use crate::{
    config::{Direction, HarnessConfig},
    conv::{convolution::Convolution, filter::{centered_key, FilterSpec}, params::ConvParams},
    error::{ConvError, Discrepancy, Result},
    geometry::shape::Shape,
    nd::{composer::NdComposer, params::{AxisParams, NdConvParams}},
    partitioner::{available_workers, Partitioner},
    timed::{timed, TimedContext},
};

use super::{
    grid::{self, Case, CaseSpec, GridCase, LineCase},
    oracle::{OracleAxis, ReferenceOracle},
    report::Report,
};

/// What happened to one case.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Matched,
    /// Matrix formulation and oracle disagree.
    Mismatch(ConvError),
    /// Parameters were rejected before anything was built.
    Skipped(String),
    /// The oracle errored or the case panicked.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub case: Case,
    pub outcome: Outcome,
    /// Residue of the first kept row modulo stride, for 1-D cases that got that far.
    pub phase: Option<usize>,
    pub elapsed: f32,
}

/// Ok when lengths agree and every position is within tolerance.
pub fn compare(observed: &[f64], expected: &[f64], tolerance: f64) -> Result<()> {
    if observed.len() != expected.len() {
        return Err(ConvError::OutputLengthMismatch { observed: observed.len(), expected: expected.len() });
    }

    let discrepancies: Vec<Discrepancy> = observed.iter().zip(expected).enumerate()
        .filter(|(_, (o, e))| !((*o - *e).abs() <= tolerance))
        .map(|(position, (&observed, &expected))| Discrepancy { position, observed, expected })
        .collect();

    if discrepancies.is_empty() {
        Ok(())
    } else {
        Err(ConvError::NumericMismatch { discrepancies })
    }
}

fn random_values(rng: &mut StdRng, values: &Uniform<u32>, count: usize) -> Vec<f64> {
    values.sample_iter(rng).take(count).map(f64::from).collect()
}

/// Framework output padding that stretches a transpose result back to input_len.
fn output_padding(input_len: usize, grad_len: usize, stride: usize, effective_len: usize, pads: (usize, usize)) -> Result<usize> {
    let base = ((grad_len - 1) * stride + effective_len).checked_sub(pads.0 + pads.1);
    base.and_then(|base| input_len.checked_sub(base))
        .ok_or_else(|| ConvError::DimensionMismatch(format!(
            "no output padding reaches length {input_len} from {grad_len} outputs")))
}

/// Setup errors become Skipped, comparison errors Mismatch, oracle errors Failed.
enum Verdict {
    Compared(Result<()>),
    Rejected(ConvError),
    Broken(ConvError),
    NothingToCheck(&'static str),
}

struct Sweep<'a> {
    config: &'a HarnessConfig,
    oracle: &'a dyn ReferenceOracle,
    values: Uniform<u32>,
}

impl Sweep<'_> {
    fn check_line(&self, line: &LineCase, direction: Direction, rng: &mut StdRng) -> (Verdict, Option<usize>) {
        let params = match FilterSpec::new(line.filter.clone(), line.key, line.dilation)
            .and_then(|filter| ConvParams::new(line.input_len, filter, line.stride, line.padding))
        {
            Ok(params) => params,
            Err(e) => return (Verdict::Rejected(e), None),
        };
        let phase = Some(params.phase());

        let conv = match Convolution::new(params.clone()) {
            Ok(conv) => conv,
            Err(e) => return (Verdict::Rejected(e), phase),
        };
        if conv.output_len() != params.output_len() {
            let e = ConvError::OutputLengthMismatch { observed: conv.output_len(), expected: params.output_len() };
            return (Verdict::Compared(Err(e)), phase);
        }

        let input_shape = Shape::d1(line.input_len);
        let filter_shape = Shape::d1(line.filter.len());
        let (pad_left, pad_right) = params.effective_padding();
        let mut axis = OracleAxis { stride: line.stride, pad_left, pad_right, dilation: line.dilation, output_padding: 0 };

        let verdict = match direction {
            Direction::Forward => {
                let input = random_values(rng, &self.values, line.input_len);
                self.judge(conv.forward(&input), || {
                    self.oracle.conv(&input, &input_shape, &line.filter, &filter_shape, &[axis])
                })
            }
            Direction::Transpose => {
                let outputs = conv.output_len();
                if outputs == 0 {
                    return (Verdict::NothingToCheck("no outputs to transpose"), phase);
                }
                axis.output_padding = match output_padding(
                    line.input_len, outputs, line.stride, params.effective_len(), (pad_left, pad_right)) {
                    Ok(padding) => padding,
                    Err(e) => return (Verdict::Broken(e), phase),
                };

                let grad = random_values(rng, &self.values, outputs);
                self.judge(conv.transpose(&grad), || {
                    self.oracle.conv_transpose(&grad, &Shape::d1(outputs), &line.filter, &filter_shape, &[axis])
                })
            }
        };

        (verdict, phase)
    }

    fn check_grid(&self, case: &GridCase, direction: Direction, rng: &mut StdRng) -> Verdict {
        if case.input_shape.len() != case.filter_shape.len() {
            return Verdict::Rejected(ConvError::DimensionMismatch(format!(
                "input rank {} with filter rank {}", case.input_shape.len(), case.filter_shape.len())));
        }

        let axes = case.input_shape.iter().zip(&case.filter_shape)
            .map(|(&input_len, &filter_len)| AxisParams::new(
                input_len, filter_len, centered_key(filter_len), case.stride, case.dilation, case.padding))
            .collect::<Result<Vec<_>>>();
        let tap_count = case.filter_shape.iter().product();
        let weights = random_values(rng, &self.values, tap_count);

        let composer = match axes.and_then(|axes| NdConvParams::new(axes, weights)).and_then(NdComposer::new) {
            Ok(composer) => composer,
            Err(e) => return Verdict::Rejected(e),
        };

        let params = composer.params();
        let input_shape = params.input_shape();
        let filter_shape = params.filter_shape();
        let mut oracle_axes: Vec<OracleAxis> = params.axes().iter().map(|axis| {
            let (pad_left, pad_right) = axis.effective_padding();
            OracleAxis { stride: axis.stride(), pad_left, pad_right, dilation: axis.dilation(), output_padding: 0 }
        }).collect();

        match direction {
            Direction::Forward => {
                let input = random_values(rng, &self.values, input_shape.size());
                self.judge(composer.forward(&input), || {
                    self.oracle.conv(&input, &input_shape, params.weights(), &filter_shape, &oracle_axes)
                })
            }
            Direction::Transpose => {
                let grad_shape = Shape::new(composer.output_shape());
                if grad_shape.size() == 0 {
                    return Verdict::NothingToCheck("no outputs to transpose");
                }
                for (oracle_axis, axis) in oracle_axes.iter_mut().zip(params.axes()) {
                    let pads = (oracle_axis.pad_left, oracle_axis.pad_right);
                    oracle_axis.output_padding = match output_padding(
                        axis.input_len(), axis.output_len(), axis.stride(), axis.effective_len(), pads) {
                        Ok(padding) => padding,
                        Err(e) => return Verdict::Broken(e),
                    };
                }

                let grad = random_values(rng, &self.values, grad_shape.size());
                self.judge(composer.transpose(&grad), || {
                    self.oracle.conv_transpose(&grad, &grad_shape, params.weights(), &filter_shape, &oracle_axes)
                })
            }
        }
    }

    fn judge(&self, observed: Result<Vec<f64>>, reference: impl FnOnce() -> Result<Vec<f64>>) -> Verdict {
        let observed = match observed {
            Ok(observed) => observed,
            Err(e) => return Verdict::Broken(e),
        };

        match reference() {
            Ok(expected) => Verdict::Compared(compare(&observed, &expected, self.config.tolerance)),
            Err(e) => Verdict::Broken(e),
        }
    }

    fn evaluate(&self, case: &Case) -> (Outcome, Option<usize>) {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(case.index as u64));
        let (verdict, phase) = match &case.spec {
            CaseSpec::Line(line) => self.check_line(line, case.direction, &mut rng),
            CaseSpec::Grid(grid) => (self.check_grid(grid, case.direction, &mut rng), None),
        };

        let outcome = match verdict {
            Verdict::Compared(Ok(())) => Outcome::Matched,
            Verdict::Compared(Err(e)) => Outcome::Mismatch(e),
            Verdict::Rejected(e) => Outcome::Skipped(e.to_string()),
            Verdict::NothingToCheck(reason) => Outcome::Skipped(reason.to_string()),
            Verdict::Broken(e) => Outcome::Failed(e.to_string()),
        };

        (outcome, phase)
    }

    /// A panic inside one case is contained to that case.
    fn run_case(&self, case: &Case) -> CaseResult {
        let (result, elapsed) = timed(|| panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(case))));

        let (outcome, phase) = result.unwrap_or_else(|payload| {
            let message = payload.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "case panicked".to_string());
            (Outcome::Failed(message), None)
        });

        match &outcome {
            Outcome::Skipped(reason) => warn!("case {} skipped: {reason} ({case})", case.index),
            outcome => debug!("case {} {:?} in {elapsed:.4}s", case.index, outcome),
        }
        if elapsed * 1000. > self.config.case_budget_ms as f32 {
            warn!("case {} took {elapsed:.3}s, over the {}ms budget ({case})", case.index, self.config.case_budget_ms);
        }

        CaseResult { case: case.clone(), outcome, phase, elapsed }
    }
}

/// Sweeps every case of the configured grid against the oracle, spread over worker threads.
pub fn run(config: &HarnessConfig, oracle: &dyn ReferenceOracle) -> Report {
    let mut context = TimedContext::new();
    let cases = grid::expand(config);
    info!("expanded {} cases in {:.3}s", cases.len(), context.checkpoint());

    let sweep = Sweep {
        config,
        oracle,
        values: Uniform::new_inclusive(1, config.max_input_value.max(1)),
    };
    let workers = config.workers.unwrap_or_else(available_workers);
    let results = Partitioner::with_partitions(cases.len(), workers).parallelized(|partition| {
        partition.range().map(|index| sweep.run_case(&cases[index])).collect::<Vec<_>>()
    });

    let report = Report::new(oracle.name(), results, context.total());
    info!("checked {} cases against {} in {:.3}s: {} matched, {} mismatched, {} skipped, {} failed",
        report.results().len(), oracle.name(), context.checkpoint(),
        report.matched(), report.mismatched(), report.skipped(), report.failed());

    report
}
