use serde_json::{Map, Value};

/// Canonical fields the importer understands, whatever the source calls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Field {
    Type,
    Ticker,
    Isin,
    Name,
    Instrument,
    Description,
    Class,
    Category,
    Quantity,
    Price,
    MarketValue,
    Value,
    Amount,
    Total,
    Date,
    Currency,
    Commission,
    Yield,
    IncomeType,
    IncomeValue,
    Notes,
    Favorite,
    Frequency,
    Until,
}

/// Header variants per field, already in normalized key form (English,
/// Portuguese and Spanish spellings).
pub(crate) const ALIASES: &[(Field, &[&str])] = &[
    (
        Field::Type,
        &[
            "type",
            "tipo",
            "kind",
            "record_type",
            "entry_type",
            "transaction_type",
            "tipo_de_movimento",
            "tipo_movimento",
            "side",
            "operation",
            "operacao",
            "operacion",
            "action",
            "natureza",
            "buy_sell",
        ],
    ),
    (
        Field::Ticker,
        &["ticker", "symbol", "simbolo", "ticker_symbol", "codigo", "sigla"],
    ),
    (Field::Isin, &["isin", "isin_code", "codigo_isin"]),
    (
        Field::Name,
        &["name", "nome", "nombre", "holding", "security", "titulo", "designacao"],
    ),
    (
        Field::Instrument,
        &["instrument", "instrumento", "product", "produto", "producto"],
    ),
    (
        Field::Description,
        &[
            "description",
            "descricao",
            "descripcion",
            "desc",
            "descr",
            "memo",
            "details",
            "detalhe",
            "detalhes",
            "concepto",
            "narrative",
            "movimento",
            "movement",
        ],
    ),
    (
        Field::Class,
        &["class", "classe", "clase", "asset_class", "classe_de_ativo", "classe_ativo"],
    ),
    (Field::Category, &["category", "categoria"]),
    (
        Field::Quantity,
        &[
            "quantity",
            "qty",
            "quantidade",
            "cantidad",
            "shares",
            "units",
            "unidades",
            "nominal",
        ],
    ),
    (
        Field::Price,
        &[
            "price",
            "preco",
            "precio",
            "cost_per_share",
            "unit_price",
            "preco_unitario",
            "avg_price",
            "preco_medio",
            "share_price",
        ],
    ),
    (
        Field::MarketValue,
        &[
            "market_value",
            "valor_de_mercado",
            "valor_mercado",
            "current_value",
            "valor_atual",
        ],
    ),
    (
        Field::Value,
        &["value", "valor", "balance", "saldo", "worth", "valor_liquido"],
    ),
    (
        Field::Amount,
        &["amount", "montante", "importe", "quantia", "amt", "transaction_amount"],
    ),
    (Field::Total, &["total", "total_value", "valor_total"]),
    (
        Field::Date,
        &[
            "date",
            "data",
            "fecha",
            "dia",
            "posted_at",
            "trade_date",
            "transaction_date",
            "booking_date",
            "value_date",
            "data_movimento",
            "data_valor",
            "data_operacao",
        ],
    ),
    (
        Field::Currency,
        &["currency", "moeda", "divisa", "moneda", "ccy"],
    ),
    (
        Field::Commission,
        &["commission", "comissao", "comision", "fee", "fees", "custos", "brokerage_fee"],
    ),
    (
        Field::Yield,
        &["yield", "dividend_yield", "rendimento", "interest_rate", "juro", "taxa_juro", "rate"],
    ),
    (
        Field::IncomeType,
        &["income_type", "tipo_rendimento", "tipo_de_rendimento"],
    ),
    (
        Field::IncomeValue,
        &["income_value", "valor_rendimento", "income_amount"],
    ),
    (
        Field::Notes,
        &["notes", "note", "notas", "nota", "observacoes", "obs", "comment", "comments", "comentario"],
    ),
    (
        Field::Favorite,
        &["favorite", "favourite", "favorito", "fav", "starred"],
    ),
    (
        Field::Frequency,
        &["frequency", "frequencia", "recurring", "recorrente", "recurrence", "periodicidade"],
    ),
    (Field::Until, &["until", "ate", "end_date", "data_fim", "hasta"]),
];

/// Hints shorter than this only count on exact matches. Longer hints also count
/// when they appear as whole tokens inside a cell (`Market Value EUR`).
const CONTAINS_MIN_HINT_LEN: usize = 4;
/// Long free-text cells never count as header words.
const CONTAINS_MAX_TOKENS: usize = 5;

pub(crate) fn aliases_for(field: Field) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Lowercases, folds accents and collapses every non-alphanumeric run to `_`.
pub(crate) fn normalize_key(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(ch);
        if folded.is_ascii_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            normalized.push(folded);
            pending_separator = false;
        } else {
            pending_separator = true;
        }
    }
    normalized
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' | 'ª' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'º' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

pub(crate) fn is_claimed_exactly(key: &str) -> bool {
    ALIASES
        .iter()
        .any(|(_, aliases)| aliases.contains(&key))
}

/// Number of cells that look like known header words.
pub(crate) fn header_score(cells: &[String]) -> usize {
    cells
        .iter()
        .filter(|cell| cell_matches_hint(&normalize_key(cell)))
        .count()
}

fn cell_matches_hint(normalized: &str) -> bool {
    if normalized.is_empty() {
        return false;
    }
    if is_claimed_exactly(normalized) {
        return true;
    }
    if normalized.split('_').count() > CONTAINS_MAX_TOKENS {
        return false;
    }
    ALIASES.iter().any(|(_, aliases)| {
        aliases
            .iter()
            .any(|hint| hint.len() >= CONTAINS_MIN_HINT_LEN && contains_token_run(normalized, hint))
    })
}

fn contains_token_run(key: &str, alias: &str) -> bool {
    let key_tokens = key.split('_').collect::<Vec<&str>>();
    let alias_tokens = alias.split('_').collect::<Vec<&str>>();
    if alias_tokens.len() > key_tokens.len() {
        return false;
    }
    key_tokens
        .windows(alias_tokens.len())
        .any(|window| window == alias_tokens.as_slice())
}

/// One row keyed by normalized header name, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { entries: pairs }
    }

    pub(crate) fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.entries.iter().all(|(_, value)| value.trim().is_empty())
    }

    /// First non-empty value for `field`: exact alias matches win, then columns no
    /// field claims exactly whose key contains an alias as a token run.
    pub(crate) fn lookup(&self, field: Field) -> Option<&str> {
        let aliases = aliases_for(field);

        for alias in aliases {
            if let Some((_, value)) = self
                .entries
                .iter()
                .find(|(key, value)| key == alias && !value.trim().is_empty())
            {
                return Some(value.trim());
            }
        }

        self.entries
            .iter()
            .filter(|(key, value)| !value.trim().is_empty() && !is_claimed_exactly(key))
            .find(|(key, _)| aliases.iter().any(|alias| contains_token_run(key, alias)))
            .map(|(_, value)| value.trim())
    }

    pub(crate) fn has(&self, field: Field) -> bool {
        self.lookup(field).is_some()
    }

    pub(crate) fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.entries {
            object.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(object)
    }
}
