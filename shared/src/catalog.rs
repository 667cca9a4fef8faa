//! Static SAT catalogs (c_RegimenFiscal, c_UsoCFDI, c_FormaPago, ...)
//!
//! Only the codes the engine needs are carried. The tables are built once and
//! shared by reference; nothing mutates them at runtime.

use std::collections::BTreeMap;
use std::sync::LazyLock;

static SAT_CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::build);

/// Immutable SAT code tables keyed by code
#[derive(Debug)]
pub struct Catalog {
    tax_regimes: BTreeMap<&'static str, &'static str>,
    cfdi_uses: BTreeMap<&'static str, &'static str>,
    payment_forms: BTreeMap<&'static str, &'static str>,
    payment_methods: BTreeMap<&'static str, &'static str>,
    currencies: BTreeMap<&'static str, &'static str>,
    relation_types: BTreeMap<&'static str, &'static str>,
}

impl Catalog {
    /// The process-wide catalog
    pub fn sat() -> &'static Catalog {
        &SAT_CATALOG
    }

    fn build() -> Self {
        Self {
            tax_regimes: BTreeMap::from([
                ("601", "General de Ley Personas Morales"),
                ("603", "Personas Morales con Fines no Lucrativos"),
                ("605", "Sueldos y Salarios e Ingresos Asimilados a Salarios"),
                ("606", "Arrendamiento"),
                ("607", "Régimen de Enajenación o Adquisición de Bienes"),
                ("608", "Demás ingresos"),
                ("610", "Residentes en el Extranjero sin Establecimiento Permanente en México"),
                ("611", "Ingresos por Dividendos (socios y accionistas)"),
                ("612", "Personas Físicas con Actividades Empresariales y Profesionales"),
                ("614", "Ingresos por intereses"),
                ("615", "Régimen de los ingresos por obtención de premios"),
                ("616", "Sin obligaciones fiscales"),
                ("620", "Sociedades Cooperativas de Producción"),
                ("621", "Incorporación Fiscal"),
                ("622", "Actividades Agrícolas, Ganaderas, Silvícolas y Pesqueras"),
                ("623", "Opcional para Grupos de Sociedades"),
                ("624", "Coordinados"),
                ("625", "Actividades Empresariales con ingresos a través de Plataformas Tecnológicas"),
                ("626", "Régimen Simplificado de Confianza"),
            ]),
            cfdi_uses: BTreeMap::from([
                ("G01", "Adquisición de mercancías"),
                ("G02", "Devoluciones, descuentos o bonificaciones"),
                ("G03", "Gastos en general"),
                ("I01", "Construcciones"),
                ("I02", "Mobiliario y equipo de oficina por inversiones"),
                ("I03", "Equipo de transporte"),
                ("I04", "Equipo de computo y accesorios"),
                ("I08", "Otra maquinaria y equipo"),
                ("D01", "Honorarios médicos, dentales y gastos hospitalarios"),
                ("D10", "Pagos por servicios educativos (colegiaturas)"),
                ("S01", "Sin efectos fiscales"),
                ("CP01", "Pagos"),
                ("CN01", "Nómina"),
            ]),
            payment_forms: BTreeMap::from([
                ("01", "Efectivo"),
                ("02", "Cheque nominativo"),
                ("03", "Transferencia electrónica de fondos"),
                ("04", "Tarjeta de crédito"),
                ("05", "Monedero electrónico"),
                ("06", "Dinero electrónico"),
                ("08", "Vales de despensa"),
                ("12", "Dación en pago"),
                ("13", "Pago por subrogación"),
                ("14", "Pago por consignación"),
                ("15", "Condonación"),
                ("17", "Compensación"),
                ("23", "Novación"),
                ("24", "Confusión"),
                ("25", "Remisión de deuda"),
                ("26", "Prescripción o caducidad"),
                ("27", "A satisfacción del acreedor"),
                ("28", "Tarjeta de débito"),
                ("29", "Tarjeta de servicios"),
                ("30", "Aplicación de anticipos"),
                ("31", "Intermediario pagos"),
                ("99", "Por definir"),
            ]),
            payment_methods: BTreeMap::from([
                ("PUE", "Pago en una sola exhibición"),
                ("PPD", "Pago en parcialidades o diferido"),
            ]),
            currencies: BTreeMap::from([
                ("MXN", "Peso Mexicano"),
                ("USD", "Dólar americano"),
                ("EUR", "Euro"),
                ("CAD", "Dólar Canadiense"),
                ("GBP", "Libra Esterlina"),
                ("JPY", "Yen"),
                ("XXX", "Transacciones sin moneda"),
            ]),
            relation_types: BTreeMap::from([
                ("01", "Nota de crédito de los documentos relacionados"),
                ("02", "Nota de débito de los documentos relacionados"),
                ("03", "Devolución de mercancía sobre facturas o traslados previos"),
                ("04", "Sustitución de los CFDI previos"),
                ("07", "CFDI por aplicación de anticipo"),
            ]),
        }
    }

    pub fn is_tax_regime(&self, code: &str) -> bool {
        self.tax_regimes.contains_key(code)
    }

    pub fn tax_regime_name(&self, code: &str) -> Option<&'static str> {
        self.tax_regimes.get(code).copied()
    }

    pub fn is_cfdi_use(&self, code: &str) -> bool {
        self.cfdi_uses.contains_key(code)
    }

    pub fn is_payment_form(&self, code: &str) -> bool {
        self.payment_forms.contains_key(code)
    }

    pub fn payment_form_name(&self, code: &str) -> Option<&'static str> {
        self.payment_forms.get(code).copied()
    }

    pub fn is_payment_method(&self, code: &str) -> bool {
        self.payment_methods.contains_key(code)
    }

    /// Currencies an invoice may be issued in (`XXX` is reserved for payment complements)
    pub fn is_invoice_currency(&self, code: &str) -> bool {
        code != "XXX" && self.currencies.contains_key(code)
    }

    pub fn is_relation_type(&self, code: &str) -> bool {
        self.relation_types.contains_key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_shared() {
        assert!(std::ptr::eq(Catalog::sat(), Catalog::sat()));
    }

    #[test]
    fn test_lookups() {
        let catalog = Catalog::sat();
        assert!(catalog.is_tax_regime("601"));
        assert!(!catalog.is_tax_regime("999"));
        assert_eq!(catalog.tax_regime_name("626"), Some("Régimen Simplificado de Confianza"));
        assert!(catalog.is_cfdi_use("G03"));
        assert!(catalog.is_payment_form("99"));
        assert!(catalog.is_payment_method("PPD"));
        assert!(!catalog.is_payment_method("XYZ"));
        assert!(catalog.is_invoice_currency("USD"));
        assert!(!catalog.is_invoice_currency("XXX"));
        assert!(catalog.is_relation_type("04"));
    }
}
