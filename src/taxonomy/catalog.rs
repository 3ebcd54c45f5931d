use super::lists::Lists;

/// One editable list inside a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListResource {
    /// URL path segment, e.g. `id-types`.
    pub slug: &'static str,
    /// JSON field name inside the document, e.g. `idTypes`.
    pub field: &'static str,
    /// Values seeded when the document is first created.
    pub defaults: &'static [&'static str],
}

/// A named configuration document: a fixed set of list resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDocument {
    /// Storage key and URL prefix, e.g. `identity-configuration`.
    pub key: &'static str,
    pub resources: &'static [ListResource],
}

impl ConfigDocument {
    /// Resolve a URL resource slug to its list definition.
    pub fn resource(&self, slug: &str) -> Option<&ListResource> {
        self.resources.iter().find(|r| r.slug == slug)
    }

    /// Field-name lookup (used when validating stored rows).
    pub fn field(&self, field: &str) -> Option<&ListResource> {
        self.resources.iter().find(|r| r.field == field)
    }

    /// Build the default field map for a fresh document.
    pub fn default_lists(&self) -> Lists {
        self.resources
            .iter()
            .map(|r| {
                (
                    r.field.to_string(),
                    r.defaults.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }
}

pub const IDENTITY: ConfigDocument = ConfigDocument {
    key: "identity-configuration",
    resources: &[
        ListResource {
            slug: "id-types",
            field: "idTypes",
            defaults: &["UMID", "Passport", "Company ID"],
        },
        ListResource {
            slug: "employment-type",
            field: "employmentType",
            defaults: &["Employed", "Self-Employed", "Unemployed", "Student", "Retired"],
        },
        ListResource {
            slug: "nature-of-work",
            field: "natureOfWork",
            defaults: &["Private Sector", "Government", "Freelance", "Business Owner", "OFW"],
        },
        ListResource {
            slug: "source-of-income",
            field: "sourceOfIncome",
            defaults: &["Salary", "Business", "Remittance", "Pension", "Allowance"],
        },
        ListResource {
            slug: "organization-type",
            field: "organizationType",
            defaults: &[
                "Corporation",
                "Partnership",
                "Sole Proprietorship",
                "NGO",
                "Cooperative",
            ],
        },
        ListResource {
            slug: "industry-sector",
            field: "industrySector",
            defaults: &[
                "Agriculture",
                "Education",
                "Finance",
                "Healthcare",
                "Information Technology",
                "Manufacturing",
                "Retail",
            ],
        },
        ListResource {
            slug: "school-type",
            field: "schoolType",
            defaults: &["Public", "Private", "State University", "Technical-Vocational"],
        },
    ],
};

pub const ACADEMIC: ConfigDocument = ConfigDocument {
    key: "academic-configuration",
    resources: &[
        ListResource {
            slug: "education-levels",
            field: "educationLevels",
            defaults: &[
                "Junior High School",
                "Senior High School",
                "Undergraduate",
                "Graduate",
            ],
        },
        ListResource {
            slug: "year-levels",
            field: "yearLevels",
            defaults: &["1st Year", "2nd Year", "3rd Year", "4th Year", "5th Year"],
        },
        ListResource {
            slug: "courses",
            field: "courses",
            defaults: &[
                "BS Computer Science",
                "BS Information Technology",
                "BS Accountancy",
                "BS Education",
                "BS Nursing",
            ],
        },
    ],
};

pub const SCHOLARSHIP: ConfigDocument = ConfigDocument {
    key: "scholarship-configuration",
    resources: &[
        ListResource {
            slug: "scholarship-types",
            field: "scholarshipTypes",
            defaults: &["Merit", "Need-Based", "Athletic", "Academic Excellence"],
        },
        ListResource {
            slug: "coverage-categories",
            field: "coverageCategories",
            defaults: &["Tuition", "Allowance", "Books", "Accommodation"],
        },
    ],
};

pub const PAYMENT: ConfigDocument = ConfigDocument {
    key: "payment-configuration",
    resources: &[
        ListResource {
            slug: "payment-methods",
            field: "paymentMethods",
            defaults: &["Bank Transfer", "GCash", "Maya", "Check"],
        },
        ListResource {
            slug: "disbursement-schedules",
            field: "disbursementSchedules",
            defaults: &["One-Time", "Monthly", "Per Semester", "Annual"],
        },
        ListResource {
            slug: "token-symbols",
            field: "tokenSymbols",
            defaults: &["PHP", "ISK"],
        },
    ],
};

/// Every configuration document the platform knows about.
pub const ALL: &[&ConfigDocument] = &[&IDENTITY, &ACADEMIC, &SCHOLARSHIP, &PAYMENT];

/// Resolve a document by its storage key / URL prefix.
pub fn document(key: &str) -> Option<&'static ConfigDocument> {
    ALL.iter().copied().find(|d| d.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_document_has_seven_lists_with_contract_defaults() {
        assert_eq!(IDENTITY.resources.len(), 7);
        let id_types = IDENTITY.resource("id-types").unwrap();
        assert_eq!(id_types.field, "idTypes");
        assert_eq!(id_types.defaults, &["UMID", "Passport", "Company ID"]);
        // school-type is a first-class resource here, same as the other six
        assert!(IDENTITY.resource("school-type").is_some());
    }

    #[test]
    fn slugs_and_fields_resolve() {
        let doc = document("identity-configuration").unwrap();
        assert_eq!(doc.resource("nature-of-work").unwrap().field, "natureOfWork");
        assert_eq!(doc.field("sourceOfIncome").unwrap().slug, "source-of-income");
        assert!(doc.resource("no-such-list").is_none());
        assert!(document("no-such-configuration").is_none());
    }

    #[test]
    fn default_lists_cover_every_resource() {
        for doc in ALL {
            let lists = doc.default_lists();
            assert_eq!(lists.len(), doc.resources.len());
            for resource in doc.resources {
                let values = lists.get(resource.field).unwrap();
                assert!(!values.is_empty(), "{} has no defaults", resource.slug);
            }
        }
    }

    #[test]
    fn no_duplicate_slugs_across_a_document() {
        for doc in ALL {
            for (i, a) in doc.resources.iter().enumerate() {
                for b in &doc.resources[i + 1..] {
                    assert_ne!(a.slug, b.slug);
                    assert_ne!(a.field, b.field);
                }
            }
        }
    }
}
