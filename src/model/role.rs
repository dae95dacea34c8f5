use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Hr, Role::Employee] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(4), None);
        assert_eq!(Role::Hr.to_string(), "hr");
    }
}
