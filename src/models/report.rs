use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Periodo {
    pub anio: i32,
    pub mes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentasPorMes {
    #[serde(rename = "_id")]
    pub periodo: Periodo,
    pub total_ingresos: Decimal,
    pub total_ventas: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentasPorCategoria {
    /// Raw `categoria` value stored on the products.
    #[serde(rename = "_id")]
    pub id: String,
    /// Category name when `id` matches a category, otherwise `id` itself.
    pub categoria: String,
    pub total_ventas: i64,
    pub ingresos: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVendedor {
    pub nombre: String,
    pub monto: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenVentas {
    pub ventas_hoy: Decimal,
    pub transacciones_hoy: i64,
    pub promedio: Decimal,
    pub top_vendedor: Option<TopVendedor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenInventario {
    pub total_productos: usize,
    pub valor_total: Decimal,
    pub stock_bajo: usize,
    pub categorias: usize,
}
