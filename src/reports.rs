//! Aggregations over already-loaded records. `MemoryStore` answers the report
//! endpoints with these; `PgStore` runs the equivalent SQL.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::models::{
    Category, Periodo, Product, ResumenInventario, ResumenVentas, Rol, TopVendedor, User, Venta,
    VentasPorCategoria, VentasPorMes,
};

/// `[start, end)` of a UTC calendar day.
pub fn day_bounds(dia: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = dia.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    (start, start + Duration::days(1))
}

pub fn promedio(total: Decimal, transacciones: i64) -> Decimal {
    if transacciones == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(transacciones)).round_dp(2)
}

pub fn ventas_por_mes(ventas: &[Venta]) -> Vec<VentasPorMes> {
    let mut grupos: BTreeMap<Periodo, (Decimal, i64)> = BTreeMap::new();
    for venta in ventas {
        let periodo = Periodo {
            anio: venta.fecha.year(),
            mes: venta.fecha.month() as i32,
        };
        let grupo = grupos.entry(periodo).or_insert((Decimal::ZERO, 0));
        grupo.0 = grupo.0.saturating_add(venta.total);
        grupo.1 += 1;
    }

    grupos
        .into_iter()
        .map(|(periodo, (total_ingresos, total_ventas))| VentasPorMes {
            periodo,
            total_ingresos,
            total_ventas,
        })
        .collect()
}

pub fn ventas_por_categoria(
    ventas: &[Venta],
    products: &[Product],
    categories: &[Category],
) -> Vec<VentasPorCategoria> {
    // The oldest product wins when several share a name.
    let mut categoria_de: HashMap<&str, &Product> = HashMap::new();
    for product in products {
        categoria_de
            .entry(product.nombre.as_str())
            .and_modify(|actual| {
                if product.creado_en < actual.creado_en {
                    *actual = product;
                }
            })
            .or_insert(product);
    }

    let nombres: HashMap<String, &str> = categories
        .iter()
        .map(|c| (c.id.to_string(), c.nombre.as_str()))
        .collect();

    let mut grupos: HashMap<&str, (i64, Decimal)> = HashMap::new();
    for linea in ventas.iter().flat_map(|v| v.productos.0.iter()) {
        let Some(product) = categoria_de.get(linea.producto.as_str()) else {
            continue;
        };
        let grupo = grupos
            .entry(product.categoria.as_str())
            .or_insert((0, Decimal::ZERO));
        grupo.0 += i64::from(linea.cantidad);
        grupo.1 = grupo.1.saturating_add(linea.subtotal().unwrap_or(Decimal::MAX));
    }

    let mut resultado: Vec<VentasPorCategoria> = grupos
        .into_iter()
        .map(|(id, (total_ventas, ingresos))| VentasPorCategoria {
            categoria: nombres.get(id).copied().unwrap_or(id).to_string(),
            id: id.to_string(),
            total_ventas,
            ingresos,
        })
        .collect();
    resultado.sort_by(|a, b| {
        b.ingresos
            .cmp(&a.ingresos)
            .then_with(|| a.categoria.cmp(&b.categoria))
    });
    resultado
}

/// Seller-role user with the highest cumulative amount, ignoring zero totals.
/// Ties keep the earliest account.
pub fn top_vendedor(users: &[User]) -> Option<TopVendedor> {
    let mut top: Option<&User> = None;
    for user in users.iter().filter(|u| u.rol == Rol::Vendedor) {
        let actual = top.map(|t| t.monto_total).unwrap_or(Decimal::ZERO);
        let mas_antiguo = top.map_or(true, |t| user.fecha_creacion < t.fecha_creacion);
        if user.monto_total > actual || (top.is_some() && user.monto_total == actual && mas_antiguo)
        {
            top = Some(user);
        }
    }

    top.map(|u| TopVendedor {
        nombre: u.nombre.clone(),
        monto: u.monto_total,
    })
}

pub fn resumen_ventas(ventas: &[Venta], users: &[User], dia: NaiveDate) -> ResumenVentas {
    let (inicio, fin) = day_bounds(dia);
    let de_hoy: Vec<&Venta> = ventas
        .iter()
        .filter(|v| v.fecha >= inicio && v.fecha < fin)
        .collect();

    let ventas_hoy = de_hoy
        .iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v.total));
    let transacciones_hoy = de_hoy.len() as i64;

    ResumenVentas {
        ventas_hoy,
        transacciones_hoy,
        promedio: promedio(ventas_hoy, transacciones_hoy),
        top_vendedor: top_vendedor(users),
    }
}

pub fn resumen_inventario(products: &[Product]) -> ResumenInventario {
    let categorias: HashSet<&str> = products.iter().map(|p| p.categoria.as_str()).collect();

    ResumenInventario {
        total_productos: products.len(),
        valor_total: products
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.stock_value())),
        stock_bajo: products.iter().filter(|p| p.is_low_stock()).count(),
        categorias: categorias.len(),
    }
}
