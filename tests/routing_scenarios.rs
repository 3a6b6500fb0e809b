//! End-to-end routing and pipeline scenarios.
//!
//! Runs the full pipeline against the seed catalog using a deterministic
//! bag-of-tokens embedder instead of the ONNX model, so these tests need no
//! model files and produce the same ranking on every run.

use miga::catalog::Catalog;
use miga::compose::Composer;
use miga::embedding::Embedder;
use miga::executor::ActionExecutor;
use miga::graph::FunctionGraph;
use miga::index::SemanticIndex;
use miga::pipeline::{ChatOutcome, Pipeline};
use miga::router;
use ndarray::Array2;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const DIM: usize = 1024;

/// Hashed bag-of-tokens embedder: each token maps to a bucket via SHA-256,
/// rows are L2-normalized. Shared tokens between query and document produce
/// proportional cosine similarity, so a query that repeats a catalog
/// example verbatim is closest to that example's document.
struct HashEmbedder;

fn token_bucket(token: &str) -> usize {
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(bytes) % DIM as u64) as usize
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[String]) -> miga::Result<Array2<f32>> {
        let mut out = Array2::zeros((texts.len(), DIM));

        for (i, text) in texts.iter().enumerate() {
            for token in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric() && c != '_')
                .filter(|t| !t.is_empty())
            {
                out[[i, token_bucket(token)]] += 1.0;
            }

            let norm: f32 = out.row(i).iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                let mut row = out.row_mut(i);
                for val in row.iter_mut() {
                    *val /= norm;
                }
            }
        }

        Ok(out)
    }
}

fn build_pipeline() -> (Pipeline, Arc<dyn Embedder>, Arc<SemanticIndex>) {
    let catalog = Catalog::seed();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder);
    let index = Arc::new(SemanticIndex::build(&catalog, embedder.as_ref()).unwrap());

    let pipeline = Pipeline::new(
        Arc::new(FunctionGraph::bakery()),
        Arc::new(ActionExecutor::new()),
        Arc::new(Composer::template_only()),
        vec![
            "consultar_precio_promos".to_string(),
            "crear_pedido".to_string(),
        ],
        12,
    );

    (pipeline, embedder, index)
}

async fn run_query(query: &str) -> ChatOutcome {
    let (pipeline, embedder, index) = build_pipeline();
    pipeline
        .run(embedder, index, "test-session".to_string(), query.to_string())
        .await
        .unwrap()
}

#[tokio::test]
async fn product_question_routes_to_search() {
    let outcome = run_query("¿Tienes pan integral?").await;

    assert_eq!(outcome.selected_function.name, "buscar_producto");
    assert!(outcome.selected_function.score > 0.4);

    // No prepended step, no dependencies: a single-step plan
    assert_eq!(outcome.plan.len(), 1);
    assert_eq!(outcome.plan[0].tool, "buscar_producto");
    assert_eq!(outcome.exec_log, vec!["paso 1/1: buscar_producto -> ok"]);
}

#[tokio::test]
async fn price_question_plans_product_lookup_first() {
    let outcome = run_query("¿Cuánto cuesta la empanada?").await;

    assert_eq!(outcome.selected_function.name, "consultar_precio_promos");
    assert_eq!(outcome.plan.len(), 2);
    assert_eq!(outcome.plan[0].tool, "buscar_producto");
    assert_eq!(outcome.plan[1].tool, "consultar_precio_promos");
    assert_eq!(
        outcome.exec_log,
        vec![
            "paso 1/2: buscar_producto -> ok",
            "paso 2/2: consultar_precio_promos -> ok",
        ]
    );
}

#[tokio::test]
async fn cancellation_executes_and_reports_state() {
    let outcome = run_query("Anula mi pedido 200 por favor").await;

    assert_eq!(outcome.selected_function.name, "cancelar_pedido");
    assert_eq!(outcome.plan.len(), 1);
    assert_eq!(outcome.exec_log, vec!["paso 1/1: cancelar_pedido -> ok"]);
    // Template response always names the routed function
    assert!(outcome.response.contains("cancelar_pedido"));
}

#[tokio::test]
async fn off_topic_question_hits_the_fallback() {
    let outcome = run_query("¿Cuál es la capital de Francia?").await;

    assert_eq!(outcome.selected_function.name, "responder_fuera_contexto");
    assert_eq!(outcome.plan.len(), 1);
    assert_eq!(outcome.plan[0].tool, "responder_fuera_contexto");
}

#[tokio::test]
async fn order_request_expands_to_full_plan() {
    let outcome = run_query("Quiero 2 cafés y 4 empanadas para retirar a las 6").await;

    assert_eq!(outcome.selected_function.name, "crear_pedido");
    let tools: Vec<&str> = outcome.plan.iter().map(|s| s.tool.as_str()).collect();
    assert_eq!(
        tools,
        vec![
            "buscar_producto",
            "calcular_costo_envio",
            "registrar_cliente",
            "crear_pedido"
        ]
    );
    assert_eq!(outcome.exec_log.len(), 4);
    assert!(outcome.exec_log.iter().all(|l| l.ends_with("-> ok")));
}

#[test]
fn every_catalog_example_routes_back_to_its_function() {
    let catalog = Catalog::seed();
    let embedder = HashEmbedder;
    let index = SemanticIndex::build(&catalog, &embedder).unwrap();

    for function in catalog.functions() {
        for example in function.atomic_examples() {
            let ranked = router::route(&index, &embedder, &example, 1, 12).unwrap();
            assert_eq!(
                ranked[0].function, function.name,
                "example {:?} should route to {}",
                example, function.name
            );
        }
    }
}

#[test]
fn routing_is_stable_across_runs() {
    let catalog = Catalog::seed();
    let embedder = HashEmbedder;
    let index = SemanticIndex::build(&catalog, &embedder).unwrap();

    let first = router::route(&index, &embedder, "¿Hay ofertas en pastelería?", 3, 12).unwrap();
    for _ in 0..5 {
        let again =
            router::route(&index, &embedder, "¿Hay ofertas en pastelería?", 3, 12).unwrap();
        assert_eq!(again.len(), first.len());
        for (a, b) in first.iter().zip(again.iter()) {
            assert_eq!(a.function, b.function);
            assert_eq!(a.score, b.score);
        }
    }
}
