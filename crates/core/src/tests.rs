#[cfg(test)]
mod tests {
    use crate::security::*;
    use crate::types::{CompanyId, PpeClass, Role, UserCtx};

    #[test]
    fn test_password_validation() {
        use crate::utils::validate_password;

        assert!(validate_password("SecurePass123!").is_ok());
        assert!(validate_password("Complex@Pass2024").is_ok());

        assert!(validate_password("short").is_err());
        assert!(validate_password("nouppercase123!").is_err());
        assert!(validate_password("NOLOWERCASE123!").is_err());
        assert!(validate_password("NoNumbers!").is_err());
        assert!(validate_password("NoSpecialChars123").is_err());
    }

    #[test]
    fn test_email_validation() {
        use crate::utils::validate_email;

        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.email+tag@domain.co.uk"));

        assert!(!validate_email("invalid-email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
    }

    #[tokio::test]
    async fn test_password_hashing() {
        let config = crate::config::SecurityConfig {
            argon2_memory_cost: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        };

        let hasher = PasswordHasher::new(&config).unwrap();
        let password = "TestPassword123!";

        let hash = hasher.hash_password(password).unwrap();
        assert!(!hash.is_empty());
        assert_ne!(hash, password);

        assert!(hasher.verify_password(password, &hash).unwrap());
        assert!(!hasher.verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn test_ppe_class_violation_type() {
        assert_eq!(PpeClass::Helmet.violation_type(), "no_helmet");
        assert_eq!(PpeClass::SafetyVest.violation_type(), "no_vest");
        assert_eq!(PpeClass::FaceMask.violation_type(), "no_mask");
    }

    #[test]
    fn test_role_default_permissions_are_scoped() {
        assert!(Role::Admin.default_permissions().contains(&"company:manage".to_string()));
        assert!(!Role::Viewer.default_permissions().contains(&"company:manage".to_string()));
        assert!(Role::Viewer.default_permissions().contains(&"cameras:read".to_string()));
    }

    #[test]
    fn test_user_ctx_permission_check() {
        let ctx = UserCtx {
            user_id: crate::types::UserId::new(),
            company_id: CompanyId::new(),
            role: Role::Operator,
            permissions: vec!["cameras:read".into(), "detection:control".into()],
        };

        assert!(ctx.has_permission("cameras:read"));
        assert!(!ctx.has_permission("company:manage"));
    }

    #[test]
    fn test_company_id_serialization() {
        let company_id = CompanyId::new();
        let serialized = serde_json::to_string(&company_id).unwrap();
        let deserialized: CompanyId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(company_id.0, deserialized.0);
    }
}
