use anyhow::Result;

use crate::cli::output::{colored_label, output_json, print_kv, print_table, OutputMode};
use crate::init::AppContext;

pub async fn handle_predict(ctx: &AppContext, ingredients: Vec<String>, mode: OutputMode) -> Result<()> {
    let response = ctx.predictor.predict(ingredients).await?;

    if mode == OutputMode::Json {
        output_json(&response);
        return Ok(());
    }

    let rows = response
        .ingredients
        .iter()
        .map(|r| vec![r.ingredient.clone(), colored_label(r.classification).to_string()])
        .collect();
    print_table(&["Ingredient", "Classification"], rows);
    println!();
    print_kv("Overall", &colored_label(response.overall_classification).to_string());

    Ok(())
}
