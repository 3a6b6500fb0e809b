//! Five-stage chat pipeline: route, explore the function graph, plan,
//! execute, respond. Stages run strictly in order and each one writes its
//! own slice of the state; later stages only read what earlier stages
//! produced.

use crate::compose::Composer;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::executor::{ActionExecutor, ExecutionResult};
use crate::graph::{FunctionGraph, FunctionId, RelatedFunction};
use crate::index::SemanticIndex;
use crate::router::{self, RouteResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Graph neighborhood of the routed function, computed by the explore
/// stage and consumed by the planner and the response prompt.
#[derive(Debug, Clone, Serialize, Default)]
pub struct GraphContext {
    pub selected_function: String,
    pub related_functions: Vec<RelatedFunction>,
    pub next_steps: Vec<FunctionId>,
    pub dependencies: Vec<FunctionId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanArgs {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub step: usize,
    pub tool: String,
    pub args: PlanArgs,
    pub desc: String,
}

/// Mutable accumulator threaded through the five stages. Each field is
/// written by exactly one stage and read only downstream; created per
/// query, dropped once the outcome is assembled.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub session_id: String,
    pub user_query: String,
    /// Stage 1.
    pub route: Option<RouteResult>,
    /// Stage 2.
    pub graph_context: Option<GraphContext>,
    /// Stage 3.
    pub plan: Vec<PlanStep>,
    /// Stage 4, append-only.
    pub exec_log: Vec<String>,
    /// Stage 4. Keyed by function name; if a tool appears twice in the
    /// plan, its last result wins.
    pub exec_results: HashMap<String, ExecutionResult>,
    /// Stage 5.
    pub final_response: String,
}

impl PipelineState {
    fn new(session_id: String, user_query: String) -> Self {
        Self {
            session_id,
            user_query,
            ..Self::default()
        }
    }

    fn into_outcome(self) -> ChatOutcome {
        let route = self.route.expect("route stage ran");
        ChatOutcome {
            session_id: self.session_id,
            query: self.user_query,
            selected_function: SelectedFunction {
                name: route.function,
                score: route.score,
            },
            plan: self.plan,
            exec_log: self.exec_log,
            response: self.final_response,
        }
    }
}

/// Everything the `/chat` endpoint returns for one query.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub session_id: String,
    pub query: String,
    pub selected_function: SelectedFunction,
    pub plan: Vec<PlanStep>,
    pub exec_log: Vec<String>,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedFunction {
    pub name: String,
    pub score: f32,
}

pub struct Pipeline {
    graph: Arc<FunctionGraph>,
    executor: Arc<ActionExecutor>,
    composer: Arc<Composer>,
    /// Functions whose plans get a product lookup prepended.
    prepend_product_lookup: Vec<String>,
    k_docs: usize,
}

impl Pipeline {
    pub fn new(
        graph: Arc<FunctionGraph>,
        executor: Arc<ActionExecutor>,
        composer: Arc<Composer>,
        prepend_product_lookup: Vec<String>,
        k_docs: usize,
    ) -> Self {
        Self {
            graph,
            executor,
            composer,
            prepend_product_lookup,
            k_docs,
        }
    }

    /// Run the full pipeline for one query. Routing errors (index missing,
    /// no candidates) propagate; execution and generation problems are
    /// absorbed into the outcome.
    pub async fn run(
        &self,
        embedder: Arc<dyn Embedder>,
        index: Arc<SemanticIndex>,
        session_id: String,
        query: String,
    ) -> Result<ChatOutcome> {
        let mut state = PipelineState::new(session_id, query);

        // Stage 1: route. Embedding is CPU-bound, keep it off the runtime.
        let route = {
            let embedder = Arc::clone(&embedder);
            let index = Arc::clone(&index);
            let query = state.user_query.clone();
            let k_docs = self.k_docs;
            tokio::task::spawn_blocking(move || {
                let mut ranked = router::route(&index, embedder.as_ref(), &query, 1, k_docs)?;
                Ok::<RouteResult, crate::error::AppError>(ranked.remove(0))
            })
            .await
            .map_err(|e| crate::error::AppError::ModelError(format!("Routing task failed: {}", e)))??
        };
        tracing::info!(
            query = %state.user_query,
            function = %route.function,
            score = route.score,
            "Stage 1: routed"
        );
        state.route = Some(route.clone());

        // Stage 2: explore the function graph
        let graph_context = self.explore(&route);
        tracing::info!(
            function = %graph_context.selected_function,
            related = graph_context.related_functions.len(),
            next_steps = ?graph_context.next_steps,
            dependencies = ?graph_context.dependencies,
            "Stage 2: graph explored"
        );
        state.graph_context = Some(graph_context);

        // Stage 3: plan
        state.plan = self.plan(
            &route,
            state.graph_context.as_ref().expect("stage 2 ran"),
            &state.user_query,
        );
        tracing::info!(
            steps = state.plan.len(),
            tools = ?state.plan.iter().map(|s| s.tool.as_str()).collect::<Vec<_>>(),
            "Stage 3: plan built"
        );

        // Stage 4: execute
        let (exec_log, exec_results) = self.execute(&state.plan, &state.user_query);
        tracing::info!(steps = state.plan.len(), "Stage 4: plan executed");
        state.exec_log = exec_log;
        state.exec_results = exec_results;

        // Stage 5: respond
        state.final_response = self
            .composer
            .respond(&state.user_query, &route, &state.exec_results)
            .await;
        tracing::info!(chars = state.final_response.len(), "Stage 5: response composed");

        Ok(state.into_outcome())
    }

    /// Functions outside the closed set get an empty neighborhood; the
    /// pipeline still answers from routing alone.
    fn explore(&self, route: &RouteResult) -> GraphContext {
        let Some(function) = FunctionId::from_name(&route.function) else {
            tracing::warn!(function = %route.function, "Routed function not in graph");
            return GraphContext {
                selected_function: route.function.clone(),
                ..GraphContext::default()
            };
        };

        GraphContext {
            selected_function: route.function.clone(),
            related_functions: self.graph.related(function),
            next_steps: self.graph.next_steps(function),
            dependencies: self.graph.required_dependencies(function),
        }
    }

    /// Plan layout: optional product lookup first, then REQUIERE
    /// dependencies, then the routed function. Step numbers are 1-based.
    fn plan(&self, route: &RouteResult, context: &GraphContext, query: &str) -> Vec<PlanStep> {
        let mut plan = Vec::new();
        let mut step = 1;

        if self
            .prepend_product_lookup
            .iter()
            .any(|f| f == &route.function)
        {
            plan.push(PlanStep {
                step,
                tool: FunctionId::BuscarProducto.as_str().to_string(),
                args: PlanArgs {
                    query: query.to_string(),
                },
                desc: "Identificar producto (paso previo del grafo)".to_string(),
            });
            step += 1;
        }

        for dep in &context.dependencies {
            plan.push(PlanStep {
                step,
                tool: dep.as_str().to_string(),
                args: PlanArgs {
                    query: query.to_string(),
                },
                desc: format!("Dependencia requerida (REQUIERE: {})", dep),
            });
            step += 1;
        }

        plan.push(PlanStep {
            step,
            tool: route.function.clone(),
            args: PlanArgs {
                query: query.to_string(),
            },
            desc: format!("Función principal seleccionada (score: {:.2})", route.score),
        });

        plan
    }

    /// Runs every step in order; failures are logged, never fatal. If a
    /// tool appears twice, its last result wins.
    fn execute(
        &self,
        plan: &[PlanStep],
        query: &str,
    ) -> (Vec<String>, HashMap<String, ExecutionResult>) {
        let total = plan.len();
        let mut log = Vec::with_capacity(total);
        let mut results = HashMap::new();

        for plan_step in plan {
            let result = self.executor.execute(&plan_step.tool, query);
            let status = if result.success { "ok" } else { "error" };

            log.push(format!(
                "paso {}/{}: {} -> {}",
                plan_step.step, total, plan_step.tool, status
            ));
            results.insert(plan_step.tool.clone(), result);
        }

        (log, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Arc::new(FunctionGraph::bakery()),
            Arc::new(ActionExecutor::new()),
            Arc::new(Composer::template_only()),
            vec![
                "consultar_precio_promos".to_string(),
                "crear_pedido".to_string(),
            ],
            12,
        )
    }

    fn route_to(function: &str) -> RouteResult {
        RouteResult {
            function: function.to_string(),
            score: 0.91,
        }
    }

    #[test]
    fn price_query_plan_prepends_product_lookup() {
        let p = pipeline();
        let route = route_to("consultar_precio_promos");
        let context = p.explore(&route);
        let plan = p.plan(&route, &context, "¿Cuánto cuesta la empanada?");

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].tool, "buscar_producto");
        assert_eq!(plan[0].step, 1);
        assert_eq!(plan[1].tool, "consultar_precio_promos");
        assert_eq!(plan[1].step, 2);
    }

    #[test]
    fn order_plan_includes_lookup_and_dependencies() {
        let p = pipeline();
        let route = route_to("crear_pedido");
        let context = p.explore(&route);
        let plan = p.plan(&route, &context, "quiero 2 cafés");

        let tools: Vec<&str> = plan.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(
            tools,
            vec![
                "buscar_producto",
                "calcular_costo_envio",
                "registrar_cliente",
                "crear_pedido"
            ]
        );
        // Step numbers are contiguous and 1-based
        for (i, s) in plan.iter().enumerate() {
            assert_eq!(s.step, i + 1);
        }
    }

    #[test]
    fn simple_query_plan_is_a_single_step() {
        let p = pipeline();
        let route = route_to("saludar_cortesia");
        let context = p.explore(&route);
        let plan = p.plan(&route, &context, "hola");

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "saludar_cortesia");
        assert!(plan[0].desc.contains("0.91"));
    }

    #[test]
    fn unknown_function_gets_empty_graph_context() {
        let p = pipeline();
        let route = route_to("funcion_misteriosa");
        let context = p.explore(&route);

        assert_eq!(context.selected_function, "funcion_misteriosa");
        assert!(context.related_functions.is_empty());
        assert!(context.next_steps.is_empty());
        assert!(context.dependencies.is_empty());

        // And the plan still carries the routed function
        let plan = p.plan(&route, &context, "???");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "funcion_misteriosa");
    }

    #[test]
    fn execution_log_reports_each_step() {
        let p = pipeline();
        let route = route_to("crear_pedido");
        let context = p.explore(&route);
        let plan = p.plan(&route, &context, "quiero pan");
        let (log, results) = p.execute(&plan, "quiero pan");

        assert_eq!(log.len(), 4);
        assert_eq!(log[0], "paso 1/4: buscar_producto -> ok");
        assert_eq!(log[3], "paso 4/4: crear_pedido -> ok");
        assert!(results.contains_key("crear_pedido"));
        assert!(results["buscar_producto"].success);
    }

    #[test]
    fn failed_step_is_logged_but_does_not_abort() {
        let p = pipeline();
        let plan = vec![
            PlanStep {
                step: 1,
                tool: "funcion_misteriosa".to_string(),
                args: PlanArgs { query: "x".into() },
                desc: "desconocida".to_string(),
            },
            PlanStep {
                step: 2,
                tool: "saludar_cortesia".to_string(),
                args: PlanArgs { query: "x".into() },
                desc: "saludo".to_string(),
            },
        ];
        let (log, results) = p.execute(&plan, "x");

        assert_eq!(log[0], "paso 1/2: funcion_misteriosa -> error");
        assert_eq!(log[1], "paso 2/2: saludar_cortesia -> ok");
        assert!(!results["funcion_misteriosa"].success);
        assert!(results["saludar_cortesia"].success);
    }

    #[test]
    fn duplicate_tool_keeps_last_result() {
        let p = pipeline();
        let plan = vec![
            PlanStep {
                step: 1,
                tool: "saludar_cortesia".to_string(),
                args: PlanArgs { query: "a".into() },
                desc: String::new(),
            },
            PlanStep {
                step: 2,
                tool: "saludar_cortesia".to_string(),
                args: PlanArgs { query: "b".into() },
                desc: String::new(),
            },
        ];
        let (log, results) = p.execute(&plan, "b");
        assert_eq!(log.len(), 2);
        assert_eq!(results.len(), 1);
    }
}
