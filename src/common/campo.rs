// src/common/campo.rs

use serde::{Deserialize, Deserializer};

/// Campo opcional de três estados vindo do ERP:
/// ausente (`None`) mantém o valor atual, `null` (`Some(None)`) limpa,
/// valor (`Some(Some(v))`) substitui.
pub type Campo<T> = Option<Option<T>>;

/// Usar com `#[serde(default, deserialize_with = "tri_state")]`.
pub fn tri_state<'de, D, T>(deserializer: D) -> Result<Campo<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Valor final do campo dado o valor atual do registro.
pub fn resolver<T: Clone>(campo: &Campo<T>, atual: &Option<T>) -> Option<T> {
    match campo {
        Some(valor) => valor.clone(),
        None => atual.clone(),
    }
}

/// Valor para um registro novo.
pub fn inicial<T: Clone>(campo: &Campo<T>) -> Option<T> {
    campo.clone().flatten()
}

/// `true` quando aplicar o campo muda o valor atual.
pub fn alterado<T: PartialEq>(campo: &Campo<T>, atual: &Option<T>) -> bool {
    matches!(campo, Some(valor) if valor != atual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "tri_state")]
        email: Campo<String>,
    }

    fn parse(json: &str) -> Campo<String> {
        serde_json::from_str::<Payload>(json).unwrap().email
    }

    #[test]
    fn distingue_ausente_nulo_e_valor() {
        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"email": null}"#), Some(None));
        assert_eq!(parse(r#"{"email": "a@b.com"}"#), Some(Some("a@b.com".to_string())));
    }

    #[test]
    fn resolver_e_alterado() {
        let atual = Some("antigo".to_string());

        assert_eq!(resolver(&None, &atual), atual);
        assert_eq!(resolver(&Some(None), &atual), None);
        assert_eq!(resolver(&Some(Some("novo".to_string())), &atual), Some("novo".to_string()));

        assert!(!alterado(&None, &atual));
        assert!(alterado(&Some(None), &atual));
        assert!(!alterado(&Some(Some("antigo".to_string())), &atual));
        assert!(!alterado::<String>(&Some(None), &None));
    }
}
