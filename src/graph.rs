//! Static relationship graph over the business functions.
//!
//! Nodes are the closed set of function identifiers; edges carry typed
//! relations (sequential step, optional transition, required dependency,
//! fallback, flow reset). Loaded once, read-only at runtime. The planner
//! consumes `required_dependencies`; the explore stage consumes
//! `related` and `next_steps`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Closed enumeration of the business functions. The executor and the graph
/// dispatch on this type; unknown catalog names stay as strings at the
/// routing layer and map to `None` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionId {
    SaludarCortesia,
    ResponderFueraContexto,
    BuscarProducto,
    ConsultarPrecioPromos,
    RecomendarProductos,
    CrearPedido,
    ActualizarPedido,
    CancelarPedido,
    ConsultarEstadoPedido,
    CalcularCostoEnvio,
    RegistrarCliente,
    ConsultarHorariosUbicaciones,
}

/// Broad node category, used by the graph data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Entrada,
    Consulta,
    Transaccion,
    Fallback,
}

impl FunctionId {
    pub const ALL: [FunctionId; 12] = [
        FunctionId::SaludarCortesia,
        FunctionId::ResponderFueraContexto,
        FunctionId::BuscarProducto,
        FunctionId::ConsultarPrecioPromos,
        FunctionId::RecomendarProductos,
        FunctionId::CrearPedido,
        FunctionId::ActualizarPedido,
        FunctionId::CancelarPedido,
        FunctionId::ConsultarEstadoPedido,
        FunctionId::CalcularCostoEnvio,
        FunctionId::RegistrarCliente,
        FunctionId::ConsultarHorariosUbicaciones,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionId::SaludarCortesia => "saludar_cortesia",
            FunctionId::ResponderFueraContexto => "responder_fuera_contexto",
            FunctionId::BuscarProducto => "buscar_producto",
            FunctionId::ConsultarPrecioPromos => "consultar_precio_promos",
            FunctionId::RecomendarProductos => "recomendar_productos",
            FunctionId::CrearPedido => "crear_pedido",
            FunctionId::ActualizarPedido => "actualizar_pedido",
            FunctionId::CancelarPedido => "cancelar_pedido",
            FunctionId::ConsultarEstadoPedido => "consultar_estado_pedido",
            FunctionId::CalcularCostoEnvio => "calcular_costo_envio",
            FunctionId::RegistrarCliente => "registrar_cliente",
            FunctionId::ConsultarHorariosUbicaciones => "consultar_horarios_ubicaciones",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            FunctionId::SaludarCortesia => "Saludar/Cortesía",
            FunctionId::ResponderFueraContexto => "Fuera de Contexto",
            FunctionId::BuscarProducto => "Buscar Producto",
            FunctionId::ConsultarPrecioPromos => "Consultar Precio",
            FunctionId::RecomendarProductos => "Recomendar",
            FunctionId::CrearPedido => "Crear Pedido",
            FunctionId::ActualizarPedido => "Actualizar Pedido",
            FunctionId::CancelarPedido => "Cancelar Pedido",
            FunctionId::ConsultarEstadoPedido => "Estado Pedido",
            FunctionId::CalcularCostoEnvio => "Costo Envío",
            FunctionId::RegistrarCliente => "Registrar Cliente",
            FunctionId::ConsultarHorariosUbicaciones => "Horarios/Ubicación",
        }
    }

    pub fn node_type(self) -> NodeType {
        match self {
            FunctionId::SaludarCortesia => NodeType::Entrada,
            FunctionId::ResponderFueraContexto => NodeType::Fallback,
            FunctionId::BuscarProducto
            | FunctionId::ConsultarPrecioPromos
            | FunctionId::RecomendarProductos
            | FunctionId::ConsultarEstadoPedido
            | FunctionId::CalcularCostoEnvio
            | FunctionId::ConsultarHorariosUbicaciones => NodeType::Consulta,
            FunctionId::CrearPedido
            | FunctionId::ActualizarPedido
            | FunctionId::CancelarPedido
            | FunctionId::RegistrarCliente => NodeType::Transaccion,
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    SequentialNext,
    MayLeadTo,
    Requires,
    Fallback,
    ResetsFlow,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::SequentialNext => "SIGUIENTE_PASO",
            RelationKind::MayLeadTo => "PUEDE_LLEVAR_A",
            RelationKind::Requires => "REQUIERE",
            RelationKind::Fallback => "FALLBACK",
            RelationKind::ResetsFlow => "REINICIA_FLUJO",
        }
    }
}

impl Serialize for RelationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation as seen from a given node: outgoing edges keep their kind,
/// incoming edges are reported as the inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Forward(RelationKind),
    Inverse(RelationKind),
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Forward(kind) => write!(f, "{}", kind),
            Relation::Inverse(kind) => write!(f, "INVERSO_{}", kind),
        }
    }
}

impl Serialize for Relation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraphEdge {
    pub from: FunctionId,
    pub to: FunctionId,
    pub rel: RelationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedFunction {
    pub function: FunctionId,
    pub relation: Relation,
}

pub struct FunctionGraph {
    nodes: Vec<FunctionId>,
    edges: Vec<GraphEdge>,
}

impl FunctionGraph {
    /// The bakery flow graph: typical purchase path, order lifecycle and
    /// fallback wiring. Orphan edges pointing at functions missing from a
    /// custom catalog are tolerated; the graph never consults the catalog.
    pub fn bakery() -> Self {
        use FunctionId::*;
        use RelationKind::*;

        let edges = vec![
            // Entry courtesy can branch into the main flows
            edge(SaludarCortesia, BuscarProducto, MayLeadTo),
            edge(SaludarCortesia, RecomendarProductos, MayLeadTo),
            edge(SaludarCortesia, ConsultarHorariosUbicaciones, MayLeadTo),
            // Search -> price -> order
            edge(BuscarProducto, ConsultarPrecioPromos, SequentialNext),
            edge(ConsultarPrecioPromos, CrearPedido, SequentialNext),
            edge(RecomendarProductos, ConsultarPrecioPromos, SequentialNext),
            // Order lifecycle
            edge(CrearPedido, CalcularCostoEnvio, Requires),
            edge(CrearPedido, RegistrarCliente, Requires),
            edge(CrearPedido, ActualizarPedido, MayLeadTo),
            edge(CrearPedido, CancelarPedido, MayLeadTo),
            edge(CrearPedido, ConsultarEstadoPedido, MayLeadTo),
            // Order modifications
            edge(ActualizarPedido, ConsultarEstadoPedido, SequentialNext),
            edge(CancelarPedido, SaludarCortesia, ResetsFlow),
            // Fallback wiring
            edge(BuscarProducto, ResponderFueraContexto, Fallback),
            edge(ConsultarPrecioPromos, ResponderFueraContexto, Fallback),
            edge(CrearPedido, ResponderFueraContexto, Fallback),
        ];

        Self {
            nodes: FunctionId::ALL.to_vec(),
            edges,
        }
    }

    pub fn nodes(&self) -> &[FunctionId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// All neighbors of a node: outgoing edges with their relation kind,
    /// incoming edges tagged as the inverse relation.
    pub fn related(&self, function: FunctionId) -> Vec<RelatedFunction> {
        let mut related = Vec::new();
        for edge in &self.edges {
            if edge.from == function {
                related.push(RelatedFunction {
                    function: edge.to,
                    relation: Relation::Forward(edge.rel),
                });
            } else if edge.to == function {
                related.push(RelatedFunction {
                    function: edge.from,
                    relation: Relation::Inverse(edge.rel),
                });
            }
        }
        related
    }

    /// Possible continuations: outgoing edges restricted to sequential,
    /// optional-transition and required-dependency relations.
    pub fn next_steps(&self, function: FunctionId) -> Vec<FunctionId> {
        self.edges
            .iter()
            .filter(|e| {
                e.from == function
                    && matches!(
                        e.rel,
                        RelationKind::SequentialNext
                            | RelationKind::MayLeadTo
                            | RelationKind::Requires
                    )
            })
            .map(|e| e.to)
            .collect()
    }

    /// Outgoing REQUIERE edges only, in declaration order.
    pub fn required_dependencies(&self, function: FunctionId) -> Vec<FunctionId> {
        self.edges
            .iter()
            .filter(|e| e.from == function && e.rel == RelationKind::Requires)
            .map(|e| e.to)
            .collect()
    }

    /// First-found BFS path over outgoing edges, ties broken by edge
    /// declaration order. Returns an empty vec when `to` is unreachable.
    /// Terminates under cycles via the visited set.
    pub fn shortest_path(&self, from: FunctionId, to: FunctionId) -> Vec<FunctionId> {
        if from == to {
            return vec![from];
        }

        let mut visited: HashSet<FunctionId> = HashSet::new();
        let mut queue: VecDeque<Vec<FunctionId>> = VecDeque::new();
        queue.push_back(vec![from]);

        while let Some(path) = queue.pop_front() {
            let node = *path.last().expect("paths are never empty");

            if node == to {
                return path;
            }

            if visited.insert(node) {
                for edge in self.edges.iter().filter(|e| e.from == node) {
                    let mut next_path = path.clone();
                    next_path.push(edge.to);
                    queue.push_back(next_path);
                }
            }
        }

        Vec::new()
    }

    /// Graph payload for the data endpoint: the original node/edge shape.
    pub fn to_data(&self) -> Value {
        json!({
            "nodes": self.nodes.iter().map(|n| json!({
                "id": n.as_str(),
                "label": n.label(),
                "tipo": n.node_type(),
            })).collect::<Vec<_>>(),
            "edges": self.edges.iter().map(|e| json!({
                "from": e.from.as_str(),
                "to": e.to.as_str(),
                "rel": e.rel.as_str(),
            })).collect::<Vec<_>>(),
        })
    }

    /// Mermaid rendering of the graph, sequential edges drawn solid.
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["graph LR".to_string()];

        for node in &self.nodes {
            lines.push(format!("    {}[{}]", node.as_str(), node.label()));
        }

        for edge in &self.edges {
            let arrow = if edge.rel == RelationKind::SequentialNext {
                "-->"
            } else {
                "-..->"
            };
            lines.push(format!(
                "    {} {}|{}| {}",
                edge.from.as_str(),
                arrow,
                edge.rel.as_str(),
                edge.to.as_str()
            ));
        }

        lines.join("\n")
    }
}

fn edge(from: FunctionId, to: FunctionId, rel: RelationKind) -> GraphEdge {
    GraphEdge { from, to, rel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FunctionId::*;

    #[test]
    fn every_name_round_trips() {
        for f in FunctionId::ALL {
            assert_eq!(FunctionId::from_name(f.as_str()), Some(f));
        }
        assert_eq!(FunctionId::from_name("hacer_magia"), None);
    }

    #[test]
    fn required_dependencies_of_crear_pedido() {
        let graph = FunctionGraph::bakery();
        assert_eq!(
            graph.required_dependencies(CrearPedido),
            vec![CalcularCostoEnvio, RegistrarCliente]
        );
        assert!(graph.required_dependencies(BuscarProducto).is_empty());
    }

    #[test]
    fn related_reports_direction() {
        let graph = FunctionGraph::bakery();
        let related = graph.related(ConsultarPrecioPromos);

        // Outgoing: crear_pedido (SIGUIENTE_PASO), fuera de contexto (FALLBACK)
        assert!(related.iter().any(|r| {
            r.function == CrearPedido && r.relation == Relation::Forward(RelationKind::SequentialNext)
        }));
        // Incoming from buscar_producto shows as inverse
        assert!(related.iter().any(|r| {
            r.function == BuscarProducto
                && r.relation == Relation::Inverse(RelationKind::SequentialNext)
        }));
    }

    #[test]
    fn inverse_relation_serializes_with_prefix() {
        let relation = Relation::Inverse(RelationKind::Requires);
        assert_eq!(relation.to_string(), "INVERSO_REQUIERE");
    }

    #[test]
    fn next_steps_follow_declaration_order() {
        let graph = FunctionGraph::bakery();
        assert_eq!(
            graph.next_steps(CrearPedido),
            vec![
                CalcularCostoEnvio,
                RegistrarCliente,
                ActualizarPedido,
                CancelarPedido,
                ConsultarEstadoPedido
            ]
        );
        // FALLBACK edges are excluded from next steps
        assert!(!graph.next_steps(BuscarProducto).contains(&ResponderFueraContexto));
    }

    #[test]
    fn bfs_finds_path_through_flow() {
        let graph = FunctionGraph::bakery();
        let path = graph.shortest_path(BuscarProducto, CrearPedido);
        assert_eq!(path, vec![BuscarProducto, ConsultarPrecioPromos, CrearPedido]);
    }

    #[test]
    fn bfs_terminates_and_returns_empty_on_unreachable() {
        let graph = FunctionGraph::bakery();
        // cancelar_pedido -> saludar_cortesia creates a cycle back toward
        // buscar_producto; nothing reaches horarios from fuera_contexto.
        let path = graph.shortest_path(ResponderFueraContexto, BuscarProducto);
        assert!(path.is_empty());

        // The cyclic region still terminates and resolves
        let cyclic = graph.shortest_path(CancelarPedido, BuscarProducto);
        assert_eq!(
            cyclic,
            vec![CancelarPedido, SaludarCortesia, BuscarProducto]
        );
    }

    #[test]
    fn path_to_self_is_single_node() {
        let graph = FunctionGraph::bakery();
        assert_eq!(graph.shortest_path(CrearPedido, CrearPedido), vec![CrearPedido]);
    }

    #[test]
    fn mermaid_lists_all_nodes_and_edges() {
        let graph = FunctionGraph::bakery();
        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph LR"));
        for node in graph.nodes() {
            assert!(mermaid.contains(node.as_str()));
        }
        assert_eq!(
            mermaid.matches("-->").count() + mermaid.matches("-..->").count(),
            graph.edges().len()
        );
    }
}
