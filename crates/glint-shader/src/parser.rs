//! Shader definition language parser
//!
//! Consumes comment-free, include-expanded text and produces a
//! `ParsedShader`. Any failure here is fatal to the whole import: a
//! pass with malformed render state would crash the GPU layer far from
//! the diagnostic site, so no partial shader is ever returned.
//!
//! Stage sub-blocks (`Vertex { ... }` / `Fragment { ... }`) are
//! captured verbatim with brace counting; everything else is tokenized.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::model::{
    BlendDescription, BlendFactor, BlendOp, ComparisonKind, CullMode, DepthDescription,
    MeshSemantic, ParsedGlobalState, ParsedPass, ParsedShader, Property, PropertyKind,
    PropertyValue, ResourceGroup, ShaderResource, ShaderSource, ShaderStageKind, StencilOp,
};

#[derive(Debug, Error, PartialEq)]
pub enum ShaderParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
    },

    #[error("unexpected end of shader source")]
    UnexpectedEof,

    #[error("line {line}: duplicate pass \"{name}\"")]
    DuplicatePass { name: String, line: u32 },

    #[error("line {line}: duplicate property \"{name}\"")]
    DuplicateProperty { name: String, line: u32 },

    #[error("line {line}: more than one Global block")]
    DuplicateGlobal { line: u32 },

    #[error("pass \"{pass}\", line {line}: unknown {what} \"{value}\"")]
    UnknownStateValue {
        pass: String,
        what: &'static str,
        value: String,
        line: u32,
    },

    #[error("pass \"{pass}\", line {line}: unknown statement \"{found}\"")]
    UnknownStatement {
        pass: String,
        found: String,
        line: u32,
    },

    #[error("pass \"{pass}\": missing {stage} program")]
    MissingStage {
        pass: String,
        stage: ShaderStageKind,
    },

    #[error("pass \"{pass}\", line {line}: duplicate {stage} program")]
    DuplicateStage {
        pass: String,
        stage: ShaderStageKind,
        line: u32,
    },

    #[error("shader \"{name}\" declares no passes")]
    NoPasses { name: String },
}

/// Parse a full shader definition file.
pub fn parse_shader(source: &str) -> Result<ParsedShader, ShaderParseError> {
    Parser::new(source).parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Eq,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("\"{s}\""),
            Token::Str(s) => format!("string \"{s}\""),
            Token::Number(n) => format!("number {n}"),
            Token::LBrace => "\"{\"".into(),
            Token::RBrace => "\"}\"".into(),
            Token::LParen => "\"(\"".into(),
            Token::RParen => "\")\"".into(),
            Token::Comma => "\",\"".into(),
            Token::Eq => "\"=\"".into(),
        }
    }
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, ShaderParseError> {
        self.skip_whitespace();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '{' => {
                self.bump();
                Token::LBrace
            }
            '}' => {
                self.bump();
                Token::RBrace
            }
            '(' => {
                self.bump();
                Token::LParen
            }
            ')' => {
                self.bump();
                Token::RParen
            }
            ',' => {
                self.bump();
                Token::Comma
            }
            '=' => {
                self.bump();
                Token::Eq
            }
            '"' => {
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump() {
                        Some('"') => break,
                        Some(c) => text.push(c),
                        None => return Err(ShaderParseError::UnexpectedEof),
                    }
                }
                Token::Str(text)
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_digit() || c == '-' || c == '.' || c == 'e' || c == 'E' {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                let value = text.parse::<f64>().map_err(|_| {
                    ShaderParseError::UnexpectedToken {
                        expected: "number".into(),
                        found: format!("\"{text}\""),
                        line: self.line,
                    }
                })?;
                Token::Number(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(text)
            }
            other => {
                return Err(ShaderParseError::UnexpectedToken {
                    expected: "token".into(),
                    found: format!("\"{other}\""),
                    line: self.line,
                });
            }
        };
        Ok(Some(token))
    }

    /// Capture raw text after an already-consumed `{` until its
    /// matching `}`, tracking nested braces so GLSL bodies survive
    /// verbatim. The delimiters themselves are not included.
    fn read_raw_block(&mut self) -> Result<String, ShaderParseError> {
        let mut depth = 1usize;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('{') => {
                    depth += 1;
                    text.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                    text.push('}');
                }
                Some(c) => text.push(c),
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
        }
    }

    fn line(&self) -> u32 {
        self.lexer.line
    }

    fn next(&mut self) -> Result<Option<Token>, ShaderParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        self.lexer.next_token()
    }

    fn peek(&mut self) -> Result<Option<&Token>, ShaderParseError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ShaderParseError> {
        match self.next()? {
            Some(token) if token == *expected => Ok(()),
            Some(token) => Err(ShaderParseError::UnexpectedToken {
                expected: what.into(),
                found: token.describe(),
                line: self.line(),
            }),
            None => Err(ShaderParseError::UnexpectedEof),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ShaderParseError> {
        match self.next()? {
            Some(Token::Ident(name)) => Ok(name),
            Some(token) => Err(ShaderParseError::UnexpectedToken {
                expected: what.into(),
                found: token.describe(),
                line: self.line(),
            }),
            None => Err(ShaderParseError::UnexpectedEof),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, ShaderParseError> {
        match self.next()? {
            Some(Token::Str(text)) => Ok(text),
            Some(token) => Err(ShaderParseError::UnexpectedToken {
                expected: what.into(),
                found: token.describe(),
                line: self.line(),
            }),
            None => Err(ShaderParseError::UnexpectedEof),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ShaderParseError> {
        let found = self.expect_ident(&format!("\"{keyword}\""))?;
        if found == keyword {
            Ok(())
        } else {
            Err(ShaderParseError::UnexpectedToken {
                expected: format!("\"{keyword}\""),
                found: format!("\"{found}\""),
                line: self.line(),
            })
        }
    }

    fn parse(mut self) -> Result<ParsedShader, ShaderParseError> {
        self.expect_keyword("Shader")?;
        let name = self.expect_string("shader name string")?;

        let mut properties = Vec::new();
        let mut passes: Vec<ParsedPass> = Vec::new();
        let mut global: Option<ParsedGlobalState> = None;

        while let Some(token) = self.next()? {
            let line = self.line();
            match token {
                Token::Ident(block) if block == "Properties" => {
                    self.parse_properties(&mut properties)?;
                }
                Token::Ident(block) if block == "Global" => {
                    if global.is_some() {
                        return Err(ShaderParseError::DuplicateGlobal { line });
                    }
                    global = Some(self.parse_global()?);
                }
                Token::Ident(block) if block == "Pass" => {
                    let pass_name = self.expect_string("pass name string")?;
                    if passes.iter().any(|p| p.name == pass_name) {
                        return Err(ShaderParseError::DuplicatePass {
                            name: pass_name,
                            line,
                        });
                    }
                    passes.push(self.parse_pass(pass_name)?);
                }
                other => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "\"Properties\", \"Global\" or \"Pass\"".into(),
                        found: other.describe(),
                        line,
                    });
                }
            }
        }

        if passes.is_empty() {
            return Err(ShaderParseError::NoPasses { name });
        }

        Ok(ParsedShader {
            name,
            properties,
            passes,
            global,
        })
    }

    fn parse_properties(
        &mut self,
        properties: &mut Vec<Property>,
    ) -> Result<(), ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Properties")?;
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(()),
                Some(Token::Ident(name)) => {
                    let line = self.line();
                    if properties.iter().any(|p| p.name == name) {
                        return Err(ShaderParseError::DuplicateProperty { name, line });
                    }
                    self.expect(&Token::LParen, "\"(\" after property name")?;
                    let display_name = self.expect_string("property display name")?;
                    self.expect(&Token::Comma, "\",\" after display name")?;
                    let kind_name = self.expect_ident("property type")?;
                    let kind = parse_property_kind(&kind_name).ok_or_else(|| {
                        ShaderParseError::UnexpectedToken {
                            expected: "property type".into(),
                            found: format!("\"{kind_name}\""),
                            line: self.line(),
                        }
                    })?;
                    self.expect(&Token::RParen, "\")\" after property type")?;

                    let default = if matches!(self.peek()?, Some(Token::Eq)) {
                        self.next()?;
                        Some(self.parse_property_value()?)
                    } else {
                        None
                    };

                    properties.push(Property {
                        name,
                        display_name,
                        kind,
                        default,
                    });
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "property name or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_property_value(&mut self) -> Result<PropertyValue, ShaderParseError> {
        match self.next()? {
            Some(Token::Number(n)) => Ok(PropertyValue::Number(n)),
            Some(Token::Str(text)) => Ok(PropertyValue::Text(text)),
            Some(Token::LParen) => {
                let mut values = Vec::new();
                loop {
                    match self.next()? {
                        Some(Token::RParen) => break,
                        Some(Token::Comma) => continue,
                        Some(Token::Number(n)) => values.push(n),
                        Some(other) => {
                            return Err(ShaderParseError::UnexpectedToken {
                                expected: "number, \",\" or \")\"".into(),
                                found: other.describe(),
                                line: self.line(),
                            });
                        }
                        None => return Err(ShaderParseError::UnexpectedEof),
                    }
                }
                Ok(PropertyValue::Vector(values))
            }
            Some(other) => Err(ShaderParseError::UnexpectedToken {
                expected: "property default value".into(),
                found: other.describe(),
                line: self.line(),
            }),
            None => Err(ShaderParseError::UnexpectedEof),
        }
    }

    fn parse_global(&mut self) -> Result<ParsedGlobalState, ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Global")?;
        let mut state = ParsedGlobalState::default();
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(state),
                Some(Token::Ident(stmt)) if stmt == "Tags" => {
                    self.parse_tags(&mut state.tags)?;
                }
                Some(Token::Ident(stmt)) if stmt == "Source" => {
                    self.expect(&Token::LBrace, "\"{\" after Source")?;
                    state.source = Some(self.lexer.read_raw_block()?);
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "\"Tags\", \"Source\" or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_tags(&mut self, tags: &mut BTreeMap<String, String>) -> Result<(), ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Tags")?;
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(()),
                Some(Token::Comma) => continue,
                Some(Token::Str(key)) => {
                    self.expect(&Token::Eq, "\"=\" after tag key")?;
                    let value = self.expect_string("tag value string")?;
                    tags.insert(key, value);
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "tag key string or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_pass(&mut self, name: String) -> Result<ParsedPass, ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after pass name")?;

        let mut pass = ParsedPass {
            name,
            tags: BTreeMap::new(),
            blend: BlendDescription::default(),
            cull: CullMode::default(),
            depth: DepthDescription::default(),
            keywords: Vec::new(),
            inputs: Vec::new(),
            resources: Vec::new(),
            sources: Vec::new(),
        };

        loop {
            let Some(token) = self.next()? else {
                return Err(ShaderParseError::UnexpectedEof);
            };
            let line = self.line();
            match token {
                Token::RBrace => break,
                Token::Ident(stmt) => match stmt.as_str() {
                    "Tags" => self.parse_tags(&mut pass.tags)?,
                    "Blend" => pass.blend = self.parse_blend(&pass.name)?,
                    "Cull" => {
                        let value = self.expect_ident("cull mode")?;
                        pass.cull = parse_cull_mode(&value).ok_or_else(|| {
                            ShaderParseError::UnknownStateValue {
                                pass: pass.name.clone(),
                                what: "cull mode",
                                value,
                                line,
                            }
                        })?;
                    }
                    "DepthTest" => {
                        let value = self.expect_ident("depth comparison")?;
                        pass.depth.test = parse_comparison(&value).ok_or_else(|| {
                            ShaderParseError::UnknownStateValue {
                                pass: pass.name.clone(),
                                what: "depth comparison",
                                value,
                                line,
                            }
                        })?;
                    }
                    "DepthWrite" => {
                        let value = self.expect_ident("On or Off")?;
                        pass.depth.write = match value.as_str() {
                            "On" => true,
                            "Off" => false,
                            _ => {
                                return Err(ShaderParseError::UnknownStateValue {
                                    pass: pass.name.clone(),
                                    what: "depth write toggle",
                                    value,
                                    line,
                                });
                            }
                        };
                    }
                    "Stencil" => self.parse_stencil(&mut pass)?,
                    "Keywords" => self.parse_keywords(&mut pass)?,
                    "Inputs" => self.parse_inputs(&mut pass)?,
                    "Vertex" => self.parse_stage(&mut pass, ShaderStageKind::Vertex)?,
                    "Fragment" => self.parse_stage(&mut pass, ShaderStageKind::Fragment)?,
                    _ => {
                        return Err(ShaderParseError::UnknownStatement {
                            pass: pass.name.clone(),
                            found: stmt,
                            line,
                        });
                    }
                },
                other => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "pass statement or \"}\"".into(),
                        found: other.describe(),
                        line,
                    });
                }
            }
        }

        for stage in [ShaderStageKind::Vertex, ShaderStageKind::Fragment] {
            if pass.source(stage).is_none() {
                return Err(ShaderParseError::MissingStage {
                    pass: pass.name,
                    stage,
                });
            }
        }

        Ok(pass)
    }

    fn parse_blend(&mut self, pass: &str) -> Result<BlendDescription, ShaderParseError> {
        let line = self.line();
        let src = self.expect_ident("source blend factor")?;
        let src_factor =
            parse_blend_factor(&src).ok_or_else(|| ShaderParseError::UnknownStateValue {
                pass: pass.to_string(),
                what: "blend factor",
                value: src,
                line,
            })?;
        let dst = self.expect_ident("destination blend factor")?;
        let dst_factor =
            parse_blend_factor(&dst).ok_or_else(|| ShaderParseError::UnknownStateValue {
                pass: pass.to_string(),
                what: "blend factor",
                value: dst,
                line,
            })?;

        // Optional trailing blend op, defaulting to Add.
        let mut op = BlendOp::Add;
        if let Some(Token::Ident(next)) = self.peek()? {
            if let Some(parsed) = parse_blend_op(next) {
                op = parsed;
                self.next()?;
            }
        }

        Ok(BlendDescription {
            src_factor,
            dst_factor,
            op,
        })
    }

    /// `Stencil { Comparison Equal  Pass Replace  Fail Keep  ZFail Keep  Ref 1 }`.
    /// Declaring the block enables the stencil test; omitted statements
    /// keep their defaults.
    fn parse_stencil(&mut self, pass: &mut ParsedPass) -> Result<(), ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Stencil")?;
        pass.depth.stencil.enabled = true;
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(()),
                Some(Token::Ident(stmt)) => {
                    let line = self.line();
                    match stmt.as_str() {
                        "Comparison" => {
                            let value = self.expect_ident("stencil comparison")?;
                            pass.depth.stencil.comparison =
                                parse_comparison(&value).ok_or_else(|| {
                                    ShaderParseError::UnknownStateValue {
                                        pass: pass.name.clone(),
                                        what: "stencil comparison",
                                        value,
                                        line,
                                    }
                                })?;
                        }
                        "Pass" => {
                            pass.depth.stencil.pass_op = self.expect_stencil_op(&pass.name)?;
                        }
                        "Fail" => {
                            pass.depth.stencil.fail_op = self.expect_stencil_op(&pass.name)?;
                        }
                        "ZFail" => {
                            pass.depth.stencil.depth_fail_op = self.expect_stencil_op(&pass.name)?;
                        }
                        "Ref" => match self.next()? {
                            Some(Token::Number(n)) => pass.depth.stencil.reference = n as u32,
                            Some(other) => {
                                return Err(ShaderParseError::UnexpectedToken {
                                    expected: "stencil reference number".into(),
                                    found: other.describe(),
                                    line: self.line(),
                                });
                            }
                            None => return Err(ShaderParseError::UnexpectedEof),
                        },
                        _ => {
                            return Err(ShaderParseError::UnknownStateValue {
                                pass: pass.name.clone(),
                                what: "stencil statement",
                                value: stmt,
                                line,
                            });
                        }
                    }
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "stencil statement or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn expect_stencil_op(&mut self, pass: &str) -> Result<StencilOp, ShaderParseError> {
        let line = self.line();
        let value = self.expect_ident("stencil operation")?;
        parse_stencil_op(&value).ok_or_else(|| ShaderParseError::UnknownStateValue {
            pass: pass.to_string(),
            what: "stencil operation",
            value,
            line,
        })
    }

    fn parse_keywords(&mut self, pass: &mut ParsedPass) -> Result<(), ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Keywords")?;
        let mut seen: HashSet<String> = HashSet::new();
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(()),
                Some(Token::Comma) => continue,
                Some(Token::Ident(keyword)) => {
                    // Repeated declarations are harmless, keep the first.
                    if seen.insert(keyword.clone()) {
                        pass.keywords.push(keyword);
                    }
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "keyword or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_inputs(&mut self, pass: &mut ParsedPass) -> Result<(), ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Inputs")?;
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(()),
                Some(Token::Ident(stmt)) if stmt == "VertexInput" => {
                    self.expect(&Token::LBrace, "\"{\" after VertexInput")?;
                    loop {
                        match self.next()? {
                            Some(Token::RBrace) => break,
                            Some(Token::Comma) => continue,
                            Some(Token::Ident(semantic)) => {
                                let line = self.line();
                                let parsed =
                                    parse_semantic(&semantic).ok_or_else(|| {
                                        ShaderParseError::UnknownStateValue {
                                            pass: pass.name.clone(),
                                            what: "vertex input semantic",
                                            value: semantic,
                                            line,
                                        }
                                    })?;
                                pass.inputs.push(parsed);
                            }
                            Some(other) => {
                                return Err(ShaderParseError::UnexpectedToken {
                                    expected: "vertex input semantic or \"}\"".into(),
                                    found: other.describe(),
                                    line: self.line(),
                                });
                            }
                            None => return Err(ShaderParseError::UnexpectedEof),
                        }
                    }
                }
                Some(Token::Ident(stmt)) if stmt == "Set" => {
                    pass.resources.push(self.parse_resource_group(&pass.name)?);
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "\"VertexInput\", \"Set\" or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_resource_group(&mut self, pass: &str) -> Result<ResourceGroup, ShaderParseError> {
        self.expect(&Token::LBrace, "\"{\" after Set")?;
        let mut group = ResourceGroup::new();
        loop {
            match self.next()? {
                Some(Token::RBrace) => return Ok(group),
                Some(Token::Ident(kind)) => {
                    let line = self.line();
                    let name = self.expect_ident("resource name")?;
                    let resource = match kind.as_str() {
                        "Texture" => ShaderResource::Texture(name),
                        "Sampler" => ShaderResource::Sampler(name),
                        "Buffer" => ShaderResource::Buffer(name),
                        _ => {
                            return Err(ShaderParseError::UnknownStateValue {
                                pass: pass.to_string(),
                                what: "resource kind",
                                value: kind,
                                line,
                            });
                        }
                    };
                    group.push(resource);
                }
                Some(other) => {
                    return Err(ShaderParseError::UnexpectedToken {
                        expected: "resource declaration or \"}\"".into(),
                        found: other.describe(),
                        line: self.line(),
                    });
                }
                None => return Err(ShaderParseError::UnexpectedEof),
            }
        }
    }

    fn parse_stage(
        &mut self,
        pass: &mut ParsedPass,
        stage: ShaderStageKind,
    ) -> Result<(), ShaderParseError> {
        let line = self.line();
        if pass.source(stage).is_some() {
            return Err(ShaderParseError::DuplicateStage {
                pass: pass.name.clone(),
                stage,
                line,
            });
        }
        self.expect(&Token::LBrace, "\"{\" before stage source")?;
        let source = self.lexer.read_raw_block()?;
        pass.sources.push(ShaderSource::new(stage, source));
        Ok(())
    }
}

fn parse_property_kind(name: &str) -> Option<PropertyKind> {
    Some(match name {
        "Float" => PropertyKind::Float,
        "Vec2" => PropertyKind::Vec2,
        "Vec3" => PropertyKind::Vec3,
        "Vec4" => PropertyKind::Vec4,
        "Color" => PropertyKind::Color,
        "Texture2D" => PropertyKind::Texture2D,
        _ => return None,
    })
}

fn parse_blend_factor(name: &str) -> Option<BlendFactor> {
    Some(match name {
        "Zero" => BlendFactor::Zero,
        "One" => BlendFactor::One,
        "SrcColor" => BlendFactor::SrcColor,
        "OneMinusSrcColor" => BlendFactor::OneMinusSrcColor,
        "SrcAlpha" => BlendFactor::SrcAlpha,
        "OneMinusSrcAlpha" => BlendFactor::OneMinusSrcAlpha,
        "DstColor" => BlendFactor::DstColor,
        "OneMinusDstColor" => BlendFactor::OneMinusDstColor,
        "DstAlpha" => BlendFactor::DstAlpha,
        "OneMinusDstAlpha" => BlendFactor::OneMinusDstAlpha,
        _ => return None,
    })
}

fn parse_blend_op(name: &str) -> Option<BlendOp> {
    Some(match name {
        "Add" => BlendOp::Add,
        "Subtract" => BlendOp::Subtract,
        "ReverseSubtract" => BlendOp::ReverseSubtract,
        "Min" => BlendOp::Min,
        "Max" => BlendOp::Max,
        _ => return None,
    })
}

fn parse_stencil_op(name: &str) -> Option<StencilOp> {
    Some(match name {
        "Keep" => StencilOp::Keep,
        "Zero" => StencilOp::Zero,
        "Replace" => StencilOp::Replace,
        "Invert" => StencilOp::Invert,
        "IncrementClamp" => StencilOp::IncrementClamp,
        "DecrementClamp" => StencilOp::DecrementClamp,
        "IncrementWrap" => StencilOp::IncrementWrap,
        "DecrementWrap" => StencilOp::DecrementWrap,
        _ => return None,
    })
}

fn parse_cull_mode(name: &str) -> Option<CullMode> {
    Some(match name {
        "Off" => CullMode::None,
        "Front" => CullMode::Front,
        "Back" => CullMode::Back,
        _ => return None,
    })
}

fn parse_comparison(name: &str) -> Option<ComparisonKind> {
    Some(match name {
        "Never" => ComparisonKind::Never,
        "Less" => ComparisonKind::Less,
        "Equal" => ComparisonKind::Equal,
        "LessEqual" => ComparisonKind::LessEqual,
        "Greater" => ComparisonKind::Greater,
        "NotEqual" => ComparisonKind::NotEqual,
        "GreaterEqual" => ComparisonKind::GreaterEqual,
        "Always" => ComparisonKind::Always,
        _ => return None,
    })
}

fn parse_semantic(name: &str) -> Option<MeshSemantic> {
    Some(match name {
        "Position" => MeshSemantic::Position,
        "Normal" => MeshSemantic::Normal,
        "Tangent" => MeshSemantic::Tangent,
        "Color" => MeshSemantic::Color,
        "UV0" => MeshSemantic::UV0,
        "UV1" => MeshSemantic::UV1,
        "BoneIndices" => MeshSemantic::BoneIndices,
        "BoneWeights" => MeshSemantic::BoneWeights,
        _ => return None,
    })
}
