//! Translation lookup used by the projection and the pages.

use crate::error::{EtiSignupsError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Pure key lookup. Implementations must never fail: a missing key
/// (or a catalog that is not loaded yet) yields a fallback string.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;

    fn t(&self, key: &str) -> String {
        self.translate(key, &[])
    }
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        (**self).translate(key, params)
    }
}

impl<T: Translator + ?Sized> Translator for std::sync::Arc<T> {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        (**self).translate(key, params)
    }
}

/// Flat key -> template catalog with `{{name}}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    strings: HashMap<String, String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    strings: HashMap<String, String>,
}

const DEFAULT_STRINGS: &[(&str, &str)] = &[
    ("title", "Inscriptos"),
    ("attendanceTitle", "Asistencia"),
    ("yes", "Sí"),
    ("no", "No"),
    ("orderNumber", "Nro de orden"),
    ("nameFirst", "Nombre"),
    ("nameLast", "Apellido"),
    ("dniNumber", "DNI"),
    ("email", "Email"),
    ("phoneNumber", "Teléfono"),
    ("country", "País"),
    ("province", "Provincia"),
    ("city", "Ciudad"),
    ("dateArrival", "Fecha de llegada"),
    ("dateDeparture", "Fecha de salida"),
    ("food", "Comida"),
    ("isCeliac", "Celíaco"),
    ("disability", "Discapacidad"),
    ("helpWith", "Ayuda con"),
    ("wantsLodging", "Alojamiento"),
    ("status", "Estado"),
    ("lastModifiedAt", "Última modificación"),
    ("daysBetweenPayment", "Días hasta el pago"),
    ("receipt", "Comprobante"),
    ("receiptButton", "Ver comprobante"),
    ("mails", "Historial de Mails"),
    ("mailsButton", "Ver Mails Enviados"),
    ("bank", "Datos Bancarios"),
    ("bankButton", "Ver Datos Bancarios"),
    ("didAttend", "Presente"),
    ("NEW", "Nuevo"),
    ("PENDING", "Pendiente"),
    ("WAITING_LIST", "Lista de espera"),
    ("PAYMENT_PENDING", "Pago pendiente"),
    ("PAYMENT_TO_CONFIRM", "Pago a confirmar"),
    ("PAYMENT_DELAYED", "Pago demorado"),
    ("CONFIRMED", "Confirmado"),
    ("FLAGGED", "Marcado"),
    ("CANCELLED", "Cancelado"),
    ("VEGETARIAN", "Vegetariana"),
    ("VEGAN", "Vegana"),
    ("OMNIVORE", "Omnívora"),
    ("CLEANING", "Limpieza"),
    ("COOKING", "Cocina"),
    ("TRANSLATION", "Traducción"),
    ("alert.title", "Confirmar asistencia"),
    (
        "alert.description",
        "¿Confirmás que {{fullName}} está presente? Esta acción no se puede deshacer.",
    ),
    ("alert.confirm", "Confirmar"),
    ("alert.cancel", "Cancelar"),
    ("contact.title", "Comisión de Género"),
    ("contact.subtitle_1", "¿Quiénes somos?"),
    (
        "contact.body_1",
        "Somos un grupo de personas que trabaja por encuentros libres de violencias. Seguinos en Facebook: ",
    ),
    (
        "contact.body_2",
        "Escuchamos situaciones de violencia durante el encuentro\nAcompañamos a quien lo necesite\nProponemos actividades de formación",
    ),
    ("contact.subtitle_2", "¿Cómo contactarnos?"),
    (
        "contact.body_3",
        "Acercate a cualquier integrante de la comisión\nEscribinos por mensaje privado",
    ),
];

impl Catalog {
    pub fn new(strings: HashMap<String, String>) -> Self {
        Self { strings }
    }

    /// Built-in Spanish strings.
    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_STRINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Parse a TOML catalog with a `[strings]` table.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Ok(Self::new(file.strings))
    }

    /// Built-in strings overlaid with the catalog at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EtiSignupsError::Config {
            message: format!("failed to read translations {}: {}", path.display(), e),
        })?;
        let overlay = Self::from_toml_str(&content)?;
        let mut catalog = Self::builtin();
        catalog.strings.extend(overlay.strings);
        tracing::debug!("Loaded {} translation keys from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.strings.get(key) else {
            return key.to_string();
        };
        interpolate(template, params)
    }
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}
