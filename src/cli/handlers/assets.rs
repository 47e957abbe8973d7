//! `fetch`: resolve both assets and report what was loaded.

use anyhow::Result;
use serde::Serialize;

use crate::assets::{AssetProvider, AssetSource};
use crate::cli::output::{output_json, print_kv, print_success, OutputMode};
use crate::init::AppContext;
use crate::pipeline::ScoringModel;

#[derive(Serialize)]
struct FetchReport {
    source: String,
    vocabulary_words: usize,
    oov_token: String,
    oov_id: Option<u32>,
    model: String,
}

pub async fn handle_fetch(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    let (vocabulary, model) = futures::try_join!(ctx.assets.vocabulary(), ctx.assets.model())?;

    let report = FetchReport {
        source: ctx.assets.source().describe(),
        vocabulary_words: vocabulary.len(),
        oov_token: vocabulary.oov_token().to_string(),
        oov_id: vocabulary.oov_id(),
        model: model.describe(),
    };

    if mode == OutputMode::Json {
        output_json(&report);
        return Ok(());
    }

    print_success("Assets ready");
    print_kv("Source", &report.source);
    print_kv("Vocabulary", &format!("{} words", report.vocabulary_words));
    let oov = match report.oov_id {
        Some(id) => format!("{} (id {})", report.oov_token, id),
        None => format!("{} (not in vocabulary)", report.oov_token),
    };
    print_kv("OOV token", &oov);
    print_kv("Model", &report.model);

    Ok(())
}
