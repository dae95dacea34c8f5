use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// employee code
    pub sub: String,
    pub name: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
