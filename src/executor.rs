//! Plan step execution against the bakery inventory.
//!
//! Every step resolves to a structured result; a failed or unrecognized
//! step never aborts the plan, it just reports `success: false` and the
//! pipeline carries on.

use crate::graph::FunctionId;
use crate::inventory;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub function: String,
    pub success: bool,
    pub data: Value,
}

pub struct ActionExecutor;

impl ActionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run one plan step. `tool` comes from the plan and may name a function
    /// the executor does not know; that yields a non-fatal failure result.
    pub fn execute(&self, tool: &str, query: &str) -> ExecutionResult {
        let Some(function) = FunctionId::from_name(tool) else {
            tracing::warn!(tool, "Unknown function in plan, skipping");
            return ExecutionResult {
                function: tool.to_string(),
                success: false,
                data: json!({ "error": "Función no implementada" }),
            };
        };

        let data = self.dispatch(function, query);
        tracing::debug!(tool, "Function executed");

        ExecutionResult {
            function: tool.to_string(),
            success: true,
            data,
        }
    }

    fn dispatch(&self, function: FunctionId, query: &str) -> Value {
        match function {
            FunctionId::SaludarCortesia => json!({
                "tipo": "cortesia",
                "sugerencias": ["Ver productos", "Hacer pedido", "Consultar horarios"],
            }),

            FunctionId::ResponderFueraContexto => json!({
                "es_fuera_contexto": true,
                "mensaje": "No puedo ayudarte con eso, pero sí con productos de panadería",
            }),

            FunctionId::BuscarProducto => {
                let mut found = inventory::search_products(query);
                if found.is_empty() {
                    // No match: show a slice of the catalog instead of nothing
                    found = inventory::PRODUCTS.iter().take(5).collect();
                }
                json!({ "productos": found })
            }

            FunctionId::ConsultarPrecioPromos => {
                let found = inventory::search_products(query);
                let precio = match found.first() {
                    Some(product) => inventory::quote_price(product.id, 1),
                    None => json!({ "mensaje": "Consulta nuestro catálogo completo" }),
                };
                json!({ "precio": precio, "promociones": inventory::promotions() })
            }

            FunctionId::RecomendarProductos => json!({
                "recomendaciones": [
                    { "nombre": "Croissant", "precio": 0.75, "razon": "Nuestro más vendido" },
                    { "nombre": "Pan Integral", "precio": 0.25, "razon": "Opción saludable" },
                    { "nombre": "Café con Leche", "precio": 2.00, "razon": "Perfecto para acompañar" },
                ],
            }),

            FunctionId::CrearPedido => json!({
                "pedido": {
                    "pedido_id": format!("PED-{}", Local::now().format("%Y%m%d%H%M%S")),
                    "estado": "creado",
                    "items": [],
                    "subtotal": 0,
                    "iva": 0,
                    "total": 0,
                },
            }),

            FunctionId::ActualizarPedido => json!({
                "mensaje": "Pedido actualizado correctamente",
            }),

            FunctionId::CancelarPedido => json!({
                "estado": "cancelado",
                "mensaje": "Pedido cancelado",
            }),

            FunctionId::ConsultarEstadoPedido => json!({
                "estado": "en_preparacion",
                "eta_minutos": 15,
                "mensaje": "Tu pedido está siendo preparado",
            }),

            FunctionId::CalcularCostoEnvio => {
                let zone = inventory::detect_zone(query);
                json!({
                    "zona": zone.zona,
                    "costo": zone.costo,
                    "tiempo_min": zone.tiempo_min,
                })
            }

            FunctionId::RegistrarCliente => json!({
                "cliente_id": format!("CLI-{}", Local::now().format("%H%M%S")),
                "mensaje": "Registrado",
            }),

            FunctionId::ConsultarHorariosUbicaciones => json!({
                "horario_hoy": inventory::today_hours(),
                "sucursales": inventory::BRANCHES,
                "todos_horarios": inventory::WEEKLY_HOURS,
            }),
        }
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}
