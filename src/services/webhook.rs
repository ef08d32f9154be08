// src/services/webhook.rs
//
// Normalização dos webhooks de mensagens. Aceita o formato da Evolution API
// (`event`, `instance`, `data.key.remoteJid`, `data.message.*`) e um formato
// plano (`cod_loja`, `telefone`, `direcao`, `texto`...). Nada aqui acessa o
// banco.

use serde_json::Value;

use crate::{
    common::error::AppError,
    models::mensagens::{DirecaoMensagem, NovaMensagem, TipoMensagem},
};

const EVENTOS_DE_MENSAGEM: &[&str] = &["messages.upsert", "send.message"];

/// Profundidade máxima da busca por um campo `base64` perdido no payload.
const PROFUNDIDADE_BUSCA_BASE64: usize = 6;

// Caminhos de texto, em ordem de preferência, relativos a `data.message`.
const CAMINHOS_TEXTO: &[&[&str]] = &[
    &["conversation"],
    &["extendedTextMessage", "text"],
    &["imageMessage", "caption"],
    &["videoMessage", "caption"],
    &["documentMessage", "caption"],
    &["documentWithCaptionMessage", "message", "documentMessage", "caption"],
    &["buttonsResponseMessage", "selectedDisplayText"],
    &["templateButtonReplyMessage", "selectedDisplayText"],
    &["listResponseMessage", "title"],
];

// Nó de mídia dentro de `data.message` e o tipo correspondente.
const NOS_MIDIA: &[(&[&str], TipoMensagem)] = &[
    (&["imageMessage"], TipoMensagem::Imagem),
    (&["stickerMessage"], TipoMensagem::Imagem),
    (&["videoMessage"], TipoMensagem::Video),
    (&["audioMessage"], TipoMensagem::Audio),
    (&["pttMessage"], TipoMensagem::Audio),
    (&["documentMessage"], TipoMensagem::Documento),
    (&["documentWithCaptionMessage", "message", "documentMessage"], TipoMensagem::Documento),
];

/// Dados usados para descobrir a loja dona do webhook.
#[derive(Debug, Default, PartialEq)]
pub struct Credenciais {
    pub apikey: Option<String>,
    pub instancia: Option<String>,
    pub server_url: Option<String>,
    pub cod_loja: Option<i32>,
}

/// Mensagem pronta para gravação, ainda sem loja/atendimento.
#[derive(Debug, Clone, PartialEq)]
pub struct MensagemRecebida {
    pub telefone: String,
    pub nome_contato: Option<String>,
    pub mensagem: NovaMensagem,
}

// ---
// Helpers sobre serde_json::Value
// ---

fn caminho<'a>(valor: &'a Value, chaves: &[&str]) -> Option<&'a Value> {
    chaves.iter().try_fold(valor, |atual, chave| atual.get(chave))
}

fn texto_em(valor: &Value, chaves: &[&str]) -> Option<String> {
    caminho(valor, chaves)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn inteiro_em(valor: &Value, chave: &str) -> Option<i32> {
    let numero = match valor.get(chave)? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    numero.filter(|n| *n > 0)
}

fn buscar_base64(valor: &Value, profundidade: usize) -> Option<String> {
    if profundidade == 0 {
        return None;
    }
    match valor {
        Value::Object(mapa) => {
            if let Some(b64) = mapa.get("base64").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                return Some(b64.to_string());
            }
            mapa.values().find_map(|v| buscar_base64(v, profundidade - 1))
        }
        Value::Array(itens) => itens.iter().find_map(|v| buscar_base64(v, profundidade - 1)),
        _ => None,
    }
}

/// `data` da Evolution pode vir como objeto, lista ou `{ messages: [...] }`.
fn dados(corpo: &Value) -> Option<&Value> {
    let data = corpo.get("data")?;
    match data {
        Value::Array(itens) => itens.first(),
        Value::Object(_) => match data.get("messages").and_then(Value::as_array) {
            Some(mensagens) if data.get("key").is_none() => mensagens.first(),
            _ => Some(data),
        },
        _ => None,
    }
}

// ---
// Evento e credenciais
// ---

/// `MESSAGES_UPSERT`, `messages-upsert` e `messages.upsert` são o mesmo evento.
pub fn normalizar_evento(evento: &str) -> String {
    evento.trim().to_lowercase().replace(['_', '-', '/'], ".")
}

/// Evento do corpo ou, na falta dele, o sufixo da rota (`/webhook/messages-upsert`).
/// `None` no formato plano, que não informa evento.
pub fn evento(corpo: &Value, sufixo_rota: Option<&str>) -> Option<String> {
    texto_em(corpo, &["event"])
        .or_else(|| sufixo_rota.map(str::to_string).filter(|s| !s.trim().is_empty()))
        .map(|e| normalizar_evento(&e))
}

pub fn e_evento_de_mensagem(evento: Option<&str>) -> bool {
    evento.is_none_or(|e| EVENTOS_DE_MENSAGEM.contains(&e))
}

/// A apikey do header tem precedência sobre a do corpo.
pub fn credenciais(corpo: &Value, apikey_header: Option<&str>) -> Credenciais {
    let apikey = apikey_header
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| texto_em(corpo, &["apikey"]));

    Credenciais {
        apikey,
        instancia: texto_em(corpo, &["instance"]).or_else(|| texto_em(corpo, &["instance", "instanceName"])),
        server_url: texto_em(corpo, &["server_url"]),
        cod_loja: inteiro_em(corpo, "cod_loja"),
    }
}

// ---
// Telefone
// ---

/// `5511999999999:12@s.whatsapp.net` -> `5511999999999`.
pub fn normalizar_telefone(jid: &str) -> String {
    let usuario = jid.split('@').next().unwrap_or_default();
    let sem_dispositivo = usuario.split(':').next().unwrap_or_default();
    sem_dispositivo.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn telefone_evolution(dados: &Value) -> Option<String> {
    let remote = texto_em(dados, &["key", "remoteJid"])?;
    // Em grupos o remetente real é o participante.
    let jid = if remote.ends_with("@g.us") {
        texto_em(dados, &["key", "participant"]).or_else(|| texto_em(dados, &["participant"]))?
    } else {
        remote
    };
    Some(normalizar_telefone(&jid)).filter(|t| !t.is_empty())
}

// ---
// Normalização
// ---

/// `Ok(None)` quando não há texto nem mídia.
pub fn normalizar(corpo: &Value) -> Result<Option<MensagemRecebida>, AppError> {
    match dados(corpo) {
        Some(dados) => normalizar_evolution(corpo, dados),
        None => normalizar_plano(corpo),
    }
}

fn telefone_obrigatorio() -> AppError {
    AppError::BadRequest("Campo telefone/numero e obrigatorio.".into())
}

fn normalizar_evolution(corpo: &Value, dados: &Value) -> Result<Option<MensagemRecebida>, AppError> {
    let telefone = telefone_evolution(dados).ok_or_else(telefone_obrigatorio)?;

    let direcao = match caminho(dados, &["key", "fromMe"]).and_then(Value::as_bool) {
        Some(true) => DirecaoMensagem::Saida,
        _ => DirecaoMensagem::Entrada,
    };

    let vazio = Value::Null;
    let mensagem = dados.get("message").unwrap_or(&vazio);

    let texto = CAMINHOS_TEXTO
        .iter()
        .find_map(|c| texto_em(mensagem, c))
        .or_else(|| texto_em(dados, &["body"]));

    let midia = NOS_MIDIA
        .iter()
        .find_map(|(c, tipo)| caminho(mensagem, c).map(|no| (no, *tipo)));

    let midia_base64 = texto_em(mensagem, &["base64"])
        .or_else(|| texto_em(dados, &["base64"]))
        .or_else(|| midia.and_then(|(no, _)| texto_em(no, &["base64"])))
        .or_else(|| buscar_base64(corpo, PROFUNDIDADE_BUSCA_BASE64));

    let mimetype = midia.and_then(|(no, _)| texto_em(no, &["mimetype"]));

    if texto.is_none() && midia_base64.is_none() {
        return Ok(None);
    }

    let tipo = match (&midia, &midia_base64, &mimetype) {
        (Some((_, tipo)), _, _) => *tipo,
        (None, Some(_), Some(m)) => TipoMensagem::pelo_mimetype(m),
        (None, Some(_), None) => TipoMensagem::Documento,
        _ => TipoMensagem::Texto,
    };

    let nome_contato = match direcao {
        DirecaoMensagem::Entrada => texto_em(dados, &["pushName"]),
        DirecaoMensagem::Saida => None,
    };

    Ok(Some(MensagemRecebida {
        telefone,
        nome_contato,
        mensagem: NovaMensagem {
            direcao,
            tipo,
            texto,
            midia_base64,
            mimetype,
            id_externo: texto_em(dados, &["key", "id"]),
            usuario_id: None,
            payload: Some(corpo.clone()),
        },
    }))
}

fn normalizar_plano(corpo: &Value) -> Result<Option<MensagemRecebida>, AppError> {
    let telefone = texto_em(corpo, &["telefone"])
        .or_else(|| texto_em(corpo, &["numero"]))
        .map(|t| normalizar_telefone(&t))
        .filter(|t| !t.is_empty())
        .ok_or_else(telefone_obrigatorio)?;

    let direcao = match texto_em(corpo, &["direcao"]) {
        None => DirecaoMensagem::Entrada,
        Some(valor) => DirecaoMensagem::parse(&valor).ok_or_else(|| {
            AppError::BadRequest("Campo direcao deve ser 'entrada' ou 'saida'.".into())
        })?,
    };

    let texto = texto_em(corpo, &["texto"]);
    let midia_base64 = texto_em(corpo, &["midia_base64"])
        .or_else(|| buscar_base64(corpo, PROFUNDIDADE_BUSCA_BASE64));
    let mimetype = texto_em(corpo, &["mimetype"]);

    if texto.is_none() && midia_base64.is_none() {
        return Ok(None);
    }

    let tipo = texto_em(corpo, &["tipo"])
        .and_then(|t| TipoMensagem::parse(&t))
        .unwrap_or_else(|| match (&midia_base64, &mimetype) {
            (Some(_), Some(m)) => TipoMensagem::pelo_mimetype(m),
            (Some(_), None) => TipoMensagem::Documento,
            _ => TipoMensagem::Texto,
        });

    let nome_contato = match direcao {
        DirecaoMensagem::Entrada => texto_em(corpo, &["contato"]).or_else(|| texto_em(corpo, &["nome"])),
        DirecaoMensagem::Saida => None,
    };

    let payload = corpo.get("payload").cloned().unwrap_or_else(|| corpo.clone());

    Ok(Some(MensagemRecebida {
        telefone,
        nome_contato,
        mensagem: NovaMensagem {
            direcao,
            tipo,
            texto,
            midia_base64,
            mimetype,
            id_externo: texto_em(corpo, &["id_externo"]),
            usuario_id: inteiro_em(corpo, "usuario_id"),
            payload: Some(payload),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upsert(data: Value) -> Value {
        json!({
            "event": "messages.upsert",
            "instance": "Loja1",
            "server_url": "https://evo.exemplo.com/",
            "apikey": "CHAVE-CORPO",
            "data": data
        })
    }

    #[test]
    fn eventos_sao_normalizados() {
        assert_eq!(normalizar_evento("MESSAGES_UPSERT"), "messages.upsert");
        assert_eq!(normalizar_evento("send-message"), "send.message");
        assert_eq!(evento(&json!({}), Some("messages-upsert")).as_deref(), Some("messages.upsert"));
        assert!(e_evento_de_mensagem(Some("send.message")));
        assert!(!e_evento_de_mensagem(Some("connection.update")));
        assert!(e_evento_de_mensagem(None));
    }

    #[test]
    fn apikey_do_header_tem_precedencia() {
        let corpo = upsert(json!({}));
        let c = credenciais(&corpo, Some("CHAVE-HEADER"));
        assert_eq!(c.apikey.as_deref(), Some("CHAVE-HEADER"));
        assert_eq!(c.instancia.as_deref(), Some("Loja1"));
        assert_eq!(credenciais(&corpo, None).apikey.as_deref(), Some("CHAVE-CORPO"));
        assert_eq!(credenciais(&json!({"cod_loja": "7"}), None).cod_loja, Some(7));
    }

    #[test]
    fn telefone_sem_sufixo_nem_dispositivo() {
        assert_eq!(normalizar_telefone("5511987654321:12@s.whatsapp.net"), "5511987654321");
        assert_eq!(normalizar_telefone("+55 (11) 98765-4321"), "5511987654321");
    }

    #[test]
    fn texto_de_entrada_com_nome() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "5511987654321@s.whatsapp.net", "fromMe": false, "id": "ABC"},
            "pushName": "Ana",
            "message": {"conversation": "Olá"}
        }));
        let m = normalizar(&corpo).unwrap().unwrap();
        assert_eq!(m.telefone, "5511987654321");
        assert_eq!(m.nome_contato.as_deref(), Some("Ana"));
        assert_eq!(m.mensagem.direcao, DirecaoMensagem::Entrada);
        assert_eq!(m.mensagem.tipo, TipoMensagem::Texto);
        assert_eq!(m.mensagem.texto.as_deref(), Some("Olá"));
        assert_eq!(m.mensagem.id_externo.as_deref(), Some("ABC"));
    }

    #[test]
    fn grupo_usa_participante() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "120363000000@g.us", "participant": "5521999990000@s.whatsapp.net"},
            "message": {"extendedTextMessage": {"text": "bom dia"}}
        }));
        assert_eq!(normalizar(&corpo).unwrap().unwrap().telefone, "5521999990000");
    }

    #[test]
    fn enviada_por_mim_e_saida_sem_nome() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "5511987654321@s.whatsapp.net", "fromMe": true},
            "pushName": "Atendente",
            "message": {"conversation": "Em que posso ajudar?"}
        }));
        let m = normalizar(&corpo).unwrap().unwrap();
        assert_eq!(m.mensagem.direcao, DirecaoMensagem::Saida);
        assert_eq!(m.nome_contato, None);
    }

    #[test]
    fn imagem_com_legenda_e_base64() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "5511987654321@s.whatsapp.net"},
            "message": {
                "imageMessage": {"caption": "nota", "mimetype": "image/jpeg"},
                "base64": "AAAA"
            }
        }));
        let m = normalizar(&corpo).unwrap().unwrap();
        assert_eq!(m.mensagem.tipo, TipoMensagem::Imagem);
        assert_eq!(m.mensagem.texto.as_deref(), Some("nota"));
        assert_eq!(m.mensagem.midia_base64.as_deref(), Some("AAAA"));
        assert_eq!(m.mensagem.mimetype.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn base64_encontrado_em_profundidade() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "5511987654321@s.whatsapp.net"},
            "message": {"audioMessage": {"mimetype": "audio/ogg"}},
            "extra": {"midia": {"conteudo": {"base64": "BBBB"}}}
        }));
        let m = normalizar(&corpo).unwrap().unwrap();
        assert_eq!(m.mensagem.tipo, TipoMensagem::Audio);
        assert_eq!(m.mensagem.midia_base64.as_deref(), Some("BBBB"));
    }

    #[test]
    fn sem_conteudo_e_ignorado() {
        let corpo = upsert(json!({
            "key": {"remoteJid": "5511987654321@s.whatsapp.net"},
            "message": {"reactionMessage": {"text": ""}}
        }));
        assert!(normalizar(&corpo).unwrap().is_none());
    }

    #[test]
    fn data_em_lista() {
        let corpo = json!({
            "event": "messages.upsert",
            "data": [{"key": {"remoteJid": "5511987654321@s.whatsapp.net"}, "message": {"conversation": "oi"}}]
        });
        assert_eq!(normalizar(&corpo).unwrap().unwrap().mensagem.texto.as_deref(), Some("oi"));
    }

    #[test]
    fn formato_plano() {
        let corpo = json!({"cod_loja": 1, "numero": "(11) 98765-4321", "texto": "oi", "nome": "Bia", "usuario_id": 3});
        let m = normalizar(&corpo).unwrap().unwrap();
        assert_eq!(m.telefone, "11987654321");
        assert_eq!(m.nome_contato.as_deref(), Some("Bia"));
        assert_eq!(m.mensagem.usuario_id, Some(3));
        assert_eq!(m.mensagem.payload, Some(corpo.clone()));
    }

    #[test]
    fn formato_plano_invalido() {
        let sem_telefone = normalizar(&json!({"cod_loja": 1, "texto": "oi"})).unwrap_err();
        assert!(matches!(sem_telefone, AppError::BadRequest(_)));

        let direcao = normalizar(&json!({"cod_loja": 1, "telefone": "11999", "direcao": "lateral", "texto": "oi"}))
            .unwrap_err();
        assert!(matches!(direcao, AppError::BadRequest(m) if m.contains("direcao")));
    }
}
