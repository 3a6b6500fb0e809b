//! Built-in bakery catalog: 12 functions covering courtesy, fallback,
//! catalog queries and order management. Mirrors what the seeding job
//! writes to the function store.

use super::FunctionDefinition;
use serde_json::json;

pub fn seed_functions() -> Vec<FunctionDefinition> {
    vec![
        FunctionDefinition {
            name: "saludar_cortesia".into(),
            business_desc: "Responder saludos, preguntas de cortesía como '¿cómo estás?', despedidas y conversación amigable inicial con el cliente.".into(),
            technical_desc: "Intent recognition para saludos y cortesía: detecta saludos, despedidas, preguntas personales al bot y responde amablemente.".into(),
            input_schema: json!({"mensaje": "string"}),
            output_schema: json!({"respuesta": "string", "sugerencia": "string?"}),
            enums: json!({"tipo": ["saludo", "despedida", "cortesia", "agradecimiento"]}),
            query_examples: vec![
                "Hola".into(),
                "Buenos días".into(),
                "¿Cómo estás?".into(),
                "¿Qué tal?".into(),
                "Buenas tardes".into(),
                "Gracias".into(),
                "Muchas gracias por tu ayuda".into(),
                "Hasta luego".into(),
                "Chao".into(),
                "Adiós".into(),
            ],
        },
        FunctionDefinition {
            name: "responder_fuera_contexto".into(),
            business_desc: "Responder cuando el cliente pregunta algo que no tiene relación con la panadería, como política, deportes, matemáticas, u otros temas.".into(),
            technical_desc: "Fallback handler: detecta preguntas fuera del dominio de panadería y redirige amablemente al cliente.".into(),
            input_schema: json!({"mensaje": "string"}),
            output_schema: json!({"respuesta": "string", "redireccion": "string"}),
            enums: json!({}),
            query_examples: vec![
                "¿Cuánto es 2+2?".into(),
                "¿Quién ganó el partido de ayer?".into(),
                "¿Cuál es la capital de Francia?".into(),
                "Háblame de política".into(),
                "¿Qué opinas del presidente?".into(),
                "Cuéntame un chiste".into(),
                "¿Cómo está el clima?".into(),
                "¿Puedes ayudarme con mi tarea de matemáticas?".into(),
                "¿Qué me recomiendas para invertir?".into(),
                "¿Cuál es el sentido de la vida?".into(),
            ],
        },
        FunctionDefinition {
            name: "buscar_producto".into(),
            business_desc: "Buscar productos del catálogo (disponibilidad, stock, categoría, restricciones como sin gluten).".into(),
            technical_desc: "Retrieval sobre catálogo: búsqueda por nombre/tags y filtros (restricciones, rango de precio, disponibilidad).".into(),
            input_schema: json!({"q": "string", "categoria": "string?", "tags": ["string"], "restricciones": ["string"], "max_precio": "number?"}),
            output_schema: json!({"results": [{"id": "string", "nombre": "string", "precio": "number", "stock": "int", "tags": ["string"]}]}),
            enums: json!({"categorias": ["pan", "pasteleria", "bebidas", "salado"], "restricciones": ["sin_gluten", "sin_azucar", "vegano"], "tags": ["integral", "dulce", "salado", "artesanal"]}),
            query_examples: vec![
                "¿Tienes pan integral?".into(),
                "Busco algo sin gluten".into(),
                "¿Qué postres hay hoy?".into(),
                "¿Tienen pan de masa madre?".into(),
                "Necesito pan sin azúcar".into(),
            ],
        },
        FunctionDefinition {
            name: "consultar_precio_promos".into(),
            business_desc: "Consultar precios unitarios, promociones 2x1, combos con descuento y ofertas vigentes de productos específicos.".into(),
            technical_desc: "Pricing lookup + reglas promocionales: aplica combos/descuentos y retorna precio final.".into(),
            input_schema: json!({"producto": "string?", "categoria": "string?", "cantidad": "number?"}),
            output_schema: json!({"precios": [{"producto": "string", "precio_unit": "number", "promo": "string?", "precio_final": "number"}]}),
            enums: json!({"promos": ["2x1", "combo_desayuno", "descuento_docena", "happy_hour"]}),
            query_examples: vec![
                "¿Cuánto cuesta la empanada?".into(),
                "¿Cuál es el precio del pan francés?".into(),
                "¿Cuánto sale una docena de croissants?".into(),
                "¿Tienen promoción 2x1 hoy?".into(),
                "¿Hay algún descuento si compro por docena?".into(),
                "¿Precio del combo desayuno?".into(),
                "¿Cuánto vale el café con leche?".into(),
                "¿Hay ofertas en pastelería?".into(),
            ],
        },
        FunctionDefinition {
            name: "recomendar_productos".into(),
            business_desc: "Recomendar productos según ocasión, gustos personales, presupuesto y restricciones alimentarias. Sugerir opciones.".into(),
            technical_desc: "Recommender basado en intención + restricciones: ranking de ítems por contexto (café, cumpleaños, etc.).".into(),
            input_schema: json!({"ocasion": "string?", "preferencia": "string?", "presupuesto": "number?", "restricciones": ["string"]}),
            output_schema: json!({"recomendaciones": [{"nombre": "string", "razon": "string", "precio": "number"}]}),
            enums: json!({"ocasion": ["desayuno", "cafe", "cumpleanos", "reunion"], "restricciones": ["sin_gluten", "sin_azucar", "vegano"]}),
            query_examples: vec![
                "Recomiéndame algo dulce".into(),
                "¿Qué me sugieres para acompañar el café?".into(),
                "Sugiereme algo para un cumpleaños".into(),
                "¿Qué me recomiendas si tengo 10 dólares?".into(),
                "Dame opciones para una reunión de trabajo".into(),
                "¿Qué postre me recomiendas?".into(),
                "Necesito ideas para un desayuno especial".into(),
                "¿Qué me sugieres sin gluten?".into(),
            ],
        },
        FunctionDefinition {
            name: "crear_pedido".into(),
            business_desc: "Crear un pedido con ítems y tipo de entrega (retiro/delivery).".into(),
            technical_desc: "Order creation: valida items, calcula total, crea registro y retorna pedido_id + ETA.".into(),
            input_schema: json!({"items": [{"producto": "string", "cantidad": "number", "unidad": "string"}], "entrega": "string", "hora": "string?", "cliente": {"nombre": "string?", "telefono": "string?"}, "direccion": "string?"}),
            output_schema: json!({"pedido_id": "string", "total": "number", "estado": "string", "eta_min": "int"}),
            enums: json!({"entrega": ["retiro", "delivery"], "unidad": ["unidad", "docena"], "estado": ["creado", "en_preparacion", "listo", "entregado"]}),
            query_examples: vec![
                "Quiero 2 cafés y 4 empanadas para retirar a las 6".into(),
                "Envíame una docena de pan a mi casa".into(),
                "Hazme un pedido de 3 panes integrales".into(),
                "Pido 1 torta para mañana a las 5".into(),
                "Quiero delivery de 2 donuts".into(),
            ],
        },
        FunctionDefinition {
            name: "actualizar_pedido".into(),
            business_desc: "Actualizar un pedido: agregar/quitar productos o cambiar cantidades.".into(),
            technical_desc: "Order update: patch de items (add/remove/update) con validación de estado y recálculo de total.".into(),
            input_schema: json!({"pedido_id": "string", "cambios": {"add": [{"producto": "string", "cantidad": "number"}], "remove": [{"producto": "string"}], "update": [{"producto": "string", "cantidad": "number"}]}, "hora": "string?", "entrega": "string?"}),
            output_schema: json!({"pedido_id": "string", "total_actualizado": "number", "estado": "string"}),
            enums: json!({"entrega": ["retiro", "delivery"]}),
            query_examples: vec![
                "Del pedido 200 quita el café".into(),
                "Agrega 2 donuts al pedido 200".into(),
                "Cambia el pedido 15 a delivery".into(),
                "Aumenta a 6 empanadas en mi pedido".into(),
                "Quita las empanadas del pedido 88".into(),
            ],
        },
        FunctionDefinition {
            name: "cancelar_pedido".into(),
            business_desc: "Cancelar un pedido por ID.".into(),
            technical_desc: "Order cancellation: cambia estado a cancelado, registra motivo y emite confirmación.".into(),
            input_schema: json!({"pedido_id": "string", "motivo": "string?"}),
            output_schema: json!({"pedido_id": "string", "estado": "string", "mensaje": "string"}),
            enums: json!({"estado": ["cancelado"], "motivo": ["cliente", "sin_stock", "error", "tiempo"]}),
            query_examples: vec![
                "Anula mi pedido 200 por favor".into(),
                "Ya no lo quiero, cancélalo".into(),
                "Cancela el pedido 55".into(),
                "Me equivoqué, anula mi pedido".into(),
                "Por favor, elimina mi orden".into(),
            ],
        },
        FunctionDefinition {
            name: "consultar_estado_pedido".into(),
            business_desc: "Consultar el estado de un pedido (en preparación, listo, entregado).".into(),
            technical_desc: "Order tracking: consulta estado + ETA y devuelve detalle de progreso.".into(),
            input_schema: json!({"pedido_id": "string"}),
            output_schema: json!({"pedido_id": "string", "estado": "string", "eta_min": "int", "detalle": "string"}),
            enums: json!({"estado": ["creado", "en_preparacion", "listo", "entregado", "cancelado"]}),
            query_examples: vec![
                "Mi pedido 55 ya está listo?".into(),
                "En qué estado está el pedido 55?".into(),
                "Ya sale mi pedido?".into(),
                "Cuánto falta para el pedido 12?".into(),
                "Mi orden está en preparación?".into(),
            ],
        },
        FunctionDefinition {
            name: "calcular_costo_envio".into(),
            business_desc: "Calcular costo y tiempo de delivery según zona o dirección.".into(),
            technical_desc: "Delivery pricing: estima ETA y costo por zona/horario y verifica cobertura.".into(),
            input_schema: json!({"direccion": "string", "zona": "string?", "hora": "string?"}),
            output_schema: json!({"costo_envio": "number", "eta_min": "int", "cobertura": "boolean"}),
            enums: json!({"zona": ["cerca", "media", "lejos"]}),
            query_examples: vec![
                "Cuánto cuesta el envío a Totoracocha?".into(),
                "Haces delivery a mi dirección?".into(),
                "Tiempo de entrega a mi barrio?".into(),
                "Cuánto sale el delivery?".into(),
                "Envían al centro?".into(),
            ],
        },
        FunctionDefinition {
            name: "registrar_cliente".into(),
            business_desc: "Registrar datos de cliente (nombre, teléfono, correo opcional).".into(),
            technical_desc: "Customer upsert: crea o actualiza cliente para notificaciones y futuros pedidos.".into(),
            input_schema: json!({"nombre": "string", "telefono": "string", "correo": "string?"}),
            output_schema: json!({"cliente_id": "string", "mensaje": "string"}),
            enums: json!({}),
            query_examples: vec![
                "Regístrame como cliente, soy Ana 09xxxx".into(),
                "Guarda mis datos, mi número es 09...".into(),
                "Mi nombre es Luis, teléfono 09...".into(),
                "Registra mi correo también".into(),
                "Crea mi perfil de cliente".into(),
            ],
        },
        FunctionDefinition {
            name: "consultar_horarios_ubicaciones".into(),
            business_desc: "Consultar horarios de atención y ubicaciones/sucursales.".into(),
            technical_desc: "Store info lookup: horarios por día/sucursal y direcciones.".into(),
            input_schema: json!({"dia": "string?", "sucursal": "string?"}),
            output_schema: json!({"sucursales": [{"nombre": "string", "direccion": "string", "horario": "string", "abierto": "boolean"}]}),
            enums: json!({"dia": ["lunes", "martes", "miercoles", "jueves", "viernes", "sabado", "domingo"]}),
            query_examples: vec![
                "A qué hora abren?".into(),
                "Dónde quedan sus sucursales?".into(),
                "Están abiertos hoy domingo?".into(),
                "Dirección de la sucursal del centro".into(),
                "Horario del sábado".into(),
            ],
        },
    ]
}
