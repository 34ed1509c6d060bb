// Walks through a single 1-D convolution: operator, mask, forward and transpose.
// cargo run --example scenario

use convmat::{
    conv::{mask, matrix_builder, sampler},
    timed, ConvParams, Convolution, FilterSpec, PaddingPolicy,
};

fn print_dense(values: &[f64], columns: usize) {
    for row in values.chunks(columns) {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>3}")).collect();
        println!("  {}", cells.join(" "));
    }
}

fn scenario() -> convmat::Result<()> {
    let filter = FilterSpec::new(vec![1., 2., 3., 2., 1.], 2, 1)?;
    let params = ConvParams::new(10, filter, 2, PaddingPolicy::Valid)?;

    let matrix = matrix_builder::build_for(&params)?;
    println!("operator ({} nonzeros):", matrix.nnz());
    print_dense(&matrix.to_dense(), params.input_len());

    let mask = mask::build_for(&params)?;
    let flags: String = mask.slots().iter().map(|&kept| if kept { 'T' } else { 'F' }).collect();
    println!("mask {flags}, {} outputs, closed form {}", mask.output_count(), params.output_len());

    let input: Vec<f64> = (1..=10).map(f64::from).collect();
    let conv = Convolution::new(params)?;
    let output = conv.forward(&input)?;
    println!("forward {output:?}");

    let spread = sampler::expand(&output, conv.mask())?;
    println!("expanded {spread:?}");
    println!("transpose {:?}", conv.transpose(&output)?);

    Ok(())
}

fn main() -> convmat::Result<()> {
    let (result, seconds) = timed::timed(scenario);
    println!("Total time to run: {seconds}");

    result
}
