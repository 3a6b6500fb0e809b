//! Static bakery business data: products, promotions, hours, branches and
//! delivery zones, plus the lookups the executor builds on. Stands in for
//! the real store database.

use chrono::{Datelike, Local};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub nombre: &'static str,
    pub precio: f64,
    pub stock: u32,
    pub categoria: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Branch {
    pub nombre: &'static str,
    pub direccion: &'static str,
    pub telefono: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeliveryZone {
    pub zona: &'static str,
    pub costo: f64,
    pub tiempo_min: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DayHours {
    pub dia: &'static str,
    pub apertura: &'static str,
    pub cierre: &'static str,
    pub abierto: bool,
}

pub const PRODUCTS: &[Product] = &[
    Product { id: "pan_frances", nombre: "Pan Francés", precio: 0.15, stock: 150, categoria: "pan" },
    Product { id: "pan_integral", nombre: "Pan Integral", precio: 0.25, stock: 80, categoria: "pan" },
    Product { id: "croissant", nombre: "Croissant", precio: 0.75, stock: 45, categoria: "pan" },
    Product { id: "empanada_pollo", nombre: "Empanada de Pollo", precio: 1.25, stock: 30, categoria: "salado" },
    Product { id: "empanada_carne", nombre: "Empanada de Carne", precio: 1.25, stock: 25, categoria: "salado" },
    Product { id: "torta_chocolate", nombre: "Torta de Chocolate", precio: 15.00, stock: 3, categoria: "pasteleria" },
    Product { id: "torta_vainilla", nombre: "Torta de Vainilla", precio: 14.00, stock: 2, categoria: "pasteleria" },
    Product { id: "donut", nombre: "Donut Glaseado", precio: 0.80, stock: 24, categoria: "pasteleria" },
    Product { id: "cafe", nombre: "Café Americano", precio: 1.50, stock: 100, categoria: "bebidas" },
    Product { id: "cafe_leche", nombre: "Café con Leche", precio: 2.00, stock: 100, categoria: "bebidas" },
    Product { id: "jugo_naranja", nombre: "Jugo de Naranja", precio: 2.50, stock: 20, categoria: "bebidas" },
    Product { id: "pan_sin_gluten", nombre: "Pan Sin Gluten", precio: 0.50, stock: 15, categoria: "pan" },
    Product { id: "galletas", nombre: "Galletas de Avena", precio: 0.30, stock: 60, categoria: "pasteleria" },
    Product { id: "brownie", nombre: "Brownie", precio: 1.00, stock: 18, categoria: "pasteleria" },
];

/// Products eligible for the dozen discount.
const DOZEN_DISCOUNT_IDS: &[&str] = &["pan_frances", "pan_integral"];
const DOZEN_DISCOUNT: f64 = 0.20;

pub const BRANCHES: &[Branch] = &[
    Branch { nombre: "Sucursal Centro", direccion: "Av. Principal 123", telefono: "07-1234567" },
    Branch { nombre: "Sucursal Norte", direccion: "Calle Norte 456", telefono: "07-2345678" },
];

/// Declaration order matters: zone detection scans in order and "otros" is
/// the catch-all, checked last.
pub const DELIVERY_ZONES: &[DeliveryZone] = &[
    DeliveryZone { zona: "centro", costo: 1.50, tiempo_min: 15 },
    DeliveryZone { zona: "norte", costo: 2.00, tiempo_min: 20 },
    DeliveryZone { zona: "sur", costo: 2.50, tiempo_min: 25 },
    DeliveryZone { zona: "totoracocha", costo: 2.00, tiempo_min: 20 },
    DeliveryZone { zona: "otros", costo: 3.50, tiempo_min: 35 },
];

/// Monday-first, matching `chrono::Weekday::num_days_from_monday`.
pub const WEEKLY_HOURS: &[DayHours] = &[
    DayHours { dia: "lunes", apertura: "07:00", cierre: "20:00", abierto: true },
    DayHours { dia: "martes", apertura: "07:00", cierre: "20:00", abierto: true },
    DayHours { dia: "miercoles", apertura: "07:00", cierre: "20:00", abierto: true },
    DayHours { dia: "jueves", apertura: "07:00", cierre: "20:00", abierto: true },
    DayHours { dia: "viernes", apertura: "07:00", cierre: "21:00", abierto: true },
    DayHours { dia: "sabado", apertura: "08:00", cierre: "18:00", abierto: true },
    DayHours { dia: "domingo", apertura: "09:00", cierre: "14:00", abierto: true },
];

pub fn promotions() -> Value {
    json!({
        "2x1_cafe": {
            "productos": ["cafe", "cafe_leche"],
            "descuento": 0.50,
            "descripcion": "2x1 en cafés (paga 1, lleva 2)"
        },
        "docena_pan": {
            "productos": ["pan_frances", "pan_integral"],
            "descuento": 0.20,
            "descripcion": "20% descuento en docena de pan"
        },
        "combo_desayuno": {
            "productos": ["cafe_leche", "croissant"],
            "precio_combo": 2.50,
            "descripcion": "Café + Croissant por $2.50"
        },
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            _ => c,
        })
        .collect()
}

pub fn find_product(id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.id == id)
}

/// Token match of a free-text query against product names and ids. Short
/// tokens (articles, fillers) are skipped so "¿tienes pan integral?" lands
/// on the breads and not on everything containing an "a".
pub fn search_products(query: &str) -> Vec<&'static Product> {
    let normalized = normalize(query);
    let tokens: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() >= 3)
        .collect();

    PRODUCTS
        .iter()
        .filter(|p| {
            let name = normalize(p.nombre);
            tokens
                .iter()
                .any(|t| name.contains(t) || p.id.contains(t))
        })
        .collect()
}

/// Price quote for a quantity of one product, dozen discount applied for
/// eligible breads.
pub fn quote_price(product_id: &str, cantidad: u32) -> Value {
    let Some(product) = find_product(product_id) else {
        return json!({ "error": format!("Producto '{}' no encontrado", product_id) });
    };

    let mut total = product.precio * f64::from(cantidad);
    let mut promo: Option<&str> = None;

    if cantidad >= 12 && DOZEN_DISCOUNT_IDS.contains(&product_id) {
        total *= 1.0 - DOZEN_DISCOUNT;
        promo = Some("docena_pan");
    }

    json!({
        "producto": product.nombre,
        "precio_unitario": product.precio,
        "cantidad": cantidad,
        "precio_total": round2(total),
        "promocion": promo,
        "stock_disponible": product.stock,
    })
}

/// Order total over `(product_id, cantidad)` items; unknown ids are skipped.
/// IVA at 12%.
pub fn compute_order(items: &[(String, u32)]) -> Value {
    let mut total = 0.0;
    let mut detalle = Vec::new();

    for (product_id, cantidad) in items {
        if let Some(product) = find_product(product_id) {
            let subtotal = product.precio * f64::from(*cantidad);
            total += subtotal;
            detalle.push(json!({
                "producto": product.nombre,
                "cantidad": cantidad,
                "precio_unit": product.precio,
                "subtotal": round2(subtotal),
            }));
        }
    }

    json!({
        "items": detalle,
        "subtotal": round2(total),
        "iva": round2(total * 0.12),
        "total": round2(total * 1.12),
    })
}

pub fn hours_for_weekday(days_from_monday: usize) -> &'static DayHours {
    &WEEKLY_HOURS[days_from_monday % 7]
}

pub fn today_hours() -> &'static DayHours {
    hours_for_weekday(Local::now().weekday().num_days_from_monday() as usize)
}

/// Picks the first zone name mentioned in the query; falls back to "otros".
pub fn detect_zone(query: &str) -> &'static DeliveryZone {
    let normalized = normalize(query);
    DELIVERY_ZONES
        .iter()
        .find(|z| z.zona != "otros" && normalized.contains(z.zona))
        .unwrap_or_else(|| {
            DELIVERY_ZONES
                .last()
                .expect("delivery zones are non-empty")
        })
}
