//! SAT catalog code lookups.
//!
//! Provides the SAT catalogs (c_Moneda, c_FormaPago, c_MetodoPago,
//! c_UsoCFDI, c_RegimenFiscal, c_ObjetoImp, c_Exportacion) needed to check
//! an invoice before stamping.
//! Only the codes are kept; labels live with the SAT.

/// Check whether `code` is a known c_Moneda code (ISO 4217 plus `XXX`).
pub fn is_known_currency_code(code: &str) -> bool {
    CURRENCY_CODES.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_FormaPago code.
pub fn is_known_payment_form(code: &str) -> bool {
    PAYMENT_FORMS.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_MetodoPago code.
pub fn is_known_payment_method(code: &str) -> bool {
    PAYMENT_METHODS.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_UsoCFDI code.
pub fn is_known_cfdi_use(code: &str) -> bool {
    CFDI_USES.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_RegimenFiscal code.
pub fn is_known_tax_regime(code: &str) -> bool {
    TAX_REGIMES.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_ObjetoImp code.
pub fn is_known_tax_object(code: &str) -> bool {
    TAX_OBJECTS.binary_search(&code).is_ok()
}

/// Check whether `code` is a known c_Exportacion code.
pub fn is_known_export_code(code: &str) -> bool {
    EXPORT_CODES.binary_search(&code).is_ok()
}

/// ISO 4217 codes, including fund and precious-metal codes, plus `XXX`
/// for payment documents. Sorted for binary search.
static CURRENCY_CODES: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BOV", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD",
    "CAD", "CDF", "CHE", "CHF", "CHW", "CLF", "CLP", "CNY", "COP", "COU", "CRC", "CUC", "CUP",
    "CVE", "CZK", "DJF", "DKK", "DOP", "DZD", "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP",
    "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ", "GYD", "HKD", "HNL", "HRK", "HTG", "HUF", "IDR",
    "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD", "JPY", "KES", "KGS", "KHR", "KMF", "KPW",
    "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR", "LRD", "LSL", "LYD", "MAD", "MDL", "MGA",
    "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR", "MWK", "MXN", "MXV", "MYR", "MZN", "NAD",
    "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN", "PGK", "PHP", "PKR", "PLN", "PYG",
    "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR", "SDG", "SEK", "SGD", "SHP", "SLE",
    "SLL", "SOS", "SRD", "SSP", "STN", "SVC", "SYP", "SZL", "THB", "TJS", "TMT", "TND", "TOP",
    "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "USN", "UYI", "UYU", "UYW", "UZS", "VED",
    "VES", "VND", "VUV", "WST", "XAF", "XAG", "XAU", "XBA", "XBB", "XBC", "XBD", "XCD", "XDR",
    "XOF", "XPD", "XPF", "XPT", "XSU", "XTS", "XUA", "XXX", "YER", "ZAR", "ZMW", "ZWL",
];

static PAYMENT_FORMS: &[&str] = &[
    "01", // Efectivo
    "02", // Cheque nominativo
    "03", // Transferencia electrónica de fondos
    "04", // Tarjeta de crédito
    "05", // Monedero electrónico
    "06", // Dinero electrónico
    "08", // Vales de despensa
    "12", // Dación en pago
    "13", // Pago por subrogación
    "14", // Pago por consignación
    "15", // Condonación
    "17", // Compensación
    "23", // Novación
    "24", // Confusión
    "25", // Remisión de deuda
    "26", // Prescripción o caducidad
    "27", // A satisfacción del acreedor
    "28", // Tarjeta de débito
    "29", // Tarjeta de servicios
    "30", // Aplicación de anticipos
    "31", // Intermediario pagos
    "99", // Por definir
];

static PAYMENT_METHODS: &[&str] = &["PPD", "PUE"];

static CFDI_USES: &[&str] = &[
    "CN01", "CP01", "D01", "D02", "D03", "D04", "D05", "D06", "D07", "D08", "D09", "D10", "G01",
    "G02", "G03", "I01", "I02", "I03", "I04", "I05", "I06", "I07", "I08", "P01", "S01",
];

static TAX_REGIMES: &[&str] = &[
    "601", "603", "605", "606", "607", "608", "609", "610", "611", "612", "614", "615", "616",
    "620", "621", "622", "623", "624", "625", "626", "628", "629", "630",
];

static TAX_OBJECTS: &[&str] = &[
    "01", // No objeto de impuesto
    "02", // Sí objeto de impuesto
    "03", // Sí objeto del impuesto y no obligado al desglose
    "04", // Sí objeto del impuesto y no causa impuesto
    "05", // Sí objeto del impuesto, IVA crédito PODEBI
    "06", // Sí objeto del IVA, no traslado IVA
    "07", // No traslado del IVA, sí desglose IEPS
    "08", // No traslado del IVA, no desglose IEPS
];

static EXPORT_CODES: &[&str] = &[
    "01", // No aplica
    "02", // Definitiva con clave A1
    "03", // Temporal
    "04", // Definitiva con clave distinta a A1
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert!(is_known_currency_code("MXN"));
        assert!(is_known_currency_code("XXX"));
        assert!(is_known_payment_form("99"));
        assert!(is_known_payment_method("PUE"));
        assert!(is_known_cfdi_use("G03"));
        assert!(is_known_cfdi_use("S01"));
        assert!(is_known_tax_regime("601"));
        assert!(is_known_tax_object("02"));
        assert!(is_known_export_code("01"));
    }

    #[test]
    fn less_common_currencies() {
        for code in ["PLN", "ZAR", "TRY", "THB", "XAU", "XDR", "MXV", "COU", "VES"] {
            assert!(is_known_currency_code(code), "{code}");
        }
        assert!(!is_known_currency_code("ABC"));
    }

    #[test]
    fn unknown_codes() {
        assert!(!is_known_currency_code("mxn"));
        assert!(!is_known_payment_form("07"));
        assert!(!is_known_payment_method("PIP"));
        assert!(!is_known_cfdi_use("P02"));
        assert!(!is_known_tax_regime("600"));
        assert!(!is_known_tax_object("09"));
        assert!(!is_known_export_code("05"));
    }

    #[test]
    fn lists_are_sorted() {
        for list in [
            CURRENCY_CODES,
            PAYMENT_FORMS,
            PAYMENT_METHODS,
            CFDI_USES,
            TAX_REGIMES,
            TAX_OBJECTS,
            EXPORT_CODES,
        ] {
            for pair in list.windows(2) {
                assert!(pair[0] < pair[1], "{} >= {}", pair[0], pair[1]);
            }
        }
    }
}
