//! Property-based checks of the matrix and mask formulation against closed forms
//! and against its own algebraic identities.

use convmat::{
    conv::{mask, matrix_builder, sampler},
    AxisParams, ConvError, ConvParams, Convolution, FilterSpec, NdComposer, NdConvParams, PaddingPolicy,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────────

fn arb_policy() -> impl Strategy<Value = PaddingPolicy> {
    prop_oneof![
        Just(PaddingPolicy::Valid),
        Just(PaddingPolicy::Same),
        (0usize..4, 0usize..4).prop_map(|(left, right)| PaddingPolicy::Explicit(left, right)),
    ]
}

/// Input length, integer weights, key, stride, dilation and policy.
fn arb_case() -> impl Strategy<Value = (usize, Vec<f64>, usize, usize, usize, PaddingPolicy)> {
    (1usize..40, prop::collection::vec(-5i32..=5, 1..6), 1usize..5, 1usize..4, arb_policy())
        .prop_flat_map(|(input_len, weights, stride, dilation, policy)| {
            let filter_len = weights.len();
            let weights = weights.into_iter().map(f64::from).collect::<Vec<_>>();
            (Just(input_len), Just(weights), 0..filter_len, Just(stride), Just(dilation), Just(policy))
        })
}

/// One axis: input length, filter length, key, stride and dilation.
fn arb_axis() -> impl Strategy<Value = (usize, usize, usize, usize, usize)> {
    (1usize..8, 1usize..4, 1usize..4, 1usize..3)
        .prop_flat_map(|(input_len, filter_len, stride, dilation)| {
            (Just(input_len), Just(filter_len), 0..filter_len, Just(stride), Just(dilation))
        })
}

fn params_for(case: &(usize, Vec<f64>, usize, usize, usize, PaddingPolicy)) -> Result<ConvParams, ConvError> {
    let (input_len, weights, key, stride, dilation, policy) = case.clone();
    ConvParams::new(input_len, FilterSpec::new(weights, key, dilation)?, stride, policy)
}

fn signal(len: usize, salt: usize) -> Vec<f64> {
    (0..len).map(|i| ((i * 7 + salt) % 11) as f64 - 5.).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ── Property tests ───────────────────────────────────────────────────────────

proptest! {
    /// The mask keeps exactly as many rows as the framework output-length formula predicts.
    #[test]
    fn mask_cardinality_matches_closed_form(case in arb_case()) {
        let params = params_for(&case);
        prop_assume!(!matches!(params, Err(ConvError::UnusablePadding { .. })));
        let params = params.unwrap();

        let actual = mask::build_for(&params).unwrap();

        prop_assert_eq!(actual.len(), params.input_len());
        prop_assert_eq!(actual.output_count(), params.output_len());
    }

    /// Kept positions are stride-spaced.
    #[test]
    fn kept_positions_share_a_phase(case in arb_case()) {
        let params = params_for(&case);
        prop_assume!(params.is_ok());
        let params = params.unwrap();

        let kept = mask::build_for(&params).unwrap().kept_positions();

        for pair in kept.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], params.stride());
        }
        if let Some(&first) = kept.first() {
            prop_assert_eq!(first % params.stride(), params.phase());
        }
    }

    /// Compaction followed by expansion restores kept values and zeroes the rest.
    #[test]
    fn compact_expand_round_trip(slots in prop::collection::vec(any::<bool>(), 1..60)) {
        let tc = convmat::Mask::from(slots.clone());
        let values: Vec<f64> = (1..=slots.len()).map(|i| i as f64).collect();

        let compacted = sampler::compact(&values, &tc).unwrap();
        let actual = sampler::expand(&compacted, &tc).unwrap();

        prop_assert_eq!(compacted.len(), tc.output_count());
        for (position, &kept) in slots.iter().enumerate() {
            prop_assert_eq!(actual[position], if kept { values[position] } else { 0. });
        }
        prop_assert_eq!(sampler::compact(&actual, &tc).unwrap(), compacted);
    }

    /// Building with a dilation equals building from the materialized dilated filter.
    #[test]
    fn dilation_matches_materialized_filter(case in arb_case()) {
        let (input_len, weights, key, _, dilation, _) = case;
        let filter = FilterSpec::new(weights, key, dilation).unwrap();
        let dilated = filter.dilated();

        let expected = matrix_builder::build(input_len, filter.weights(), key, dilation).unwrap();
        let actual = matrix_builder::build(input_len, dilated.weights(), dilated.key(), 1).unwrap();

        prop_assert_eq!(actual, expected);
    }

    /// The transpose path is the adjoint of the forward path: <Ax, y> = <x, Aᵗy>.
    #[test]
    fn transpose_is_adjoint(case in arb_case()) {
        let params = params_for(&case);
        prop_assume!(params.is_ok());
        let conv = Convolution::new(params.unwrap()).unwrap();
        let x = signal(conv.params().input_len(), 3);
        let y = signal(conv.output_len(), 5);

        let forward = conv.forward(&x).unwrap();
        let transposed = conv.transpose(&y).unwrap();

        prop_assert_eq!(forward.len(), y.len());
        prop_assert_eq!(transposed.len(), x.len());
        prop_assert_eq!(dot(&forward, &y), dot(&x, &transposed));
    }

    /// A rank-2 problem whose leading axis is a single row reduces to the 1-D operator.
    #[test]
    fn single_row_grid_matches_line(case in arb_case()) {
        let params = params_for(&case);
        prop_assume!(params.is_ok());
        let params = params.unwrap();
        let (input_len, weights, key, stride, dilation, policy) = case;
        let leading = match policy {
            PaddingPolicy::Explicit(..) => PaddingPolicy::Explicit(0, 0),
            other => other,
        };
        let grid = NdConvParams::new(vec![
            AxisParams::new(1, 1, 0, 1, 1, leading).unwrap(),
            AxisParams::new(input_len, weights.len(), key, stride, dilation, policy).unwrap(),
        ], weights).unwrap();
        let x = signal(input_len, 1);

        let expected = Convolution::new(params).unwrap().forward(&x).unwrap();
        let actual = NdComposer::new(grid).unwrap().forward(&x).unwrap();

        prop_assert_eq!(actual, expected);
    }

    /// At every multi-index the N-D mask is the AND of the per-axis masks, and it keeps
    /// the product of the per-axis counts.
    #[test]
    fn grid_mask_factorizes(policy in arb_policy(), axes in prop::collection::vec(arb_axis(), 3)) {
        let axes: Vec<AxisParams> = axes.iter().map(|&(input_len, filter_len, key, stride, dilation)| {
            let extents = AxisParams::new(input_len, filter_len, key, stride, dilation, PaddingPolicy::Valid).unwrap();
            let padding = match policy {
                PaddingPolicy::Explicit(left, right) =>
                    PaddingPolicy::Explicit(left.min(extents.left_extent()), right.min(extents.right_extent())),
                other => other,
            };
            AxisParams::new(input_len, filter_len, key, stride, dilation, padding).unwrap()
        }).collect();
        let axis_masks: Vec<_> = axes.iter().map(|axis| axis.mask().unwrap()).collect();
        let expected_count: usize = axes.iter().map(AxisParams::output_len).product();
        let weights = vec![1.; axes.iter().map(AxisParams::filter_len).product()];

        let composer = NdComposer::new(NdConvParams::new(axes, weights).unwrap()).unwrap();

        let shape = composer.input_shape();
        for index in shape.indices() {
            let expected = index.iter().zip(&axis_masks).all(|(&coordinate, mask)| mask.slots()[coordinate]);
            prop_assert_eq!(composer.mask().slots()[shape.flatten(&index).unwrap()], expected, "at {:?}", index);
        }
        prop_assert_eq!(composer.mask().output_count(), expected_count);
        prop_assert_eq!(composer.output_shape().iter().product::<usize>(), expected_count);
    }
}
