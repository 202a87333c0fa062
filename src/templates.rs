//! CloudFormation templates embedded in the binary.

/// Template of the base stack: VPC, director subnet, NAT box, director
/// elastic IP, and director IAM user.
pub const BASE_STACK_TEMPLATE: &str = include_str!("../templates/base-stack.json");

/// Template of the application stack: private subnet, security groups, and
/// load balancer.
pub const APPLICATION_STACK_TEMPLATE: &str = include_str!("../templates/application-stack.json");

/// Parameter names the base stack template declares.
pub mod base_parameters {
    /// AMI of the NAT box.
    pub const NAT_INSTANCE_AMI: &str = "NATInstanceAMI";
    /// Key pair installed on the NAT box.
    pub const KEY_NAME: &str = "KeyName";
}

/// Parameter names the application stack template declares.
pub mod application_parameters {
    /// VPC created by the base stack.
    pub const VPC_ID: &str = "VPCID";
    /// NAT instance routing outbound traffic.
    pub const NAT_INSTANCE: &str = "NATInstance";
    /// Subnet the load balancer is placed in.
    pub const PUBLICLY_ROUTABLE_SUBNET_ID: &str = "PubliclyRoutableSubnetID";
    /// Availability zone of the application subnet.
    pub const AVAILABILITY_ZONE: &str = "AvailabilityZone";
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::cloud_config::application_logical_ids;
    use crate::resources::base_logical_ids;

    fn parse(template: &str) -> Value {
        serde_json::from_str(template).unwrap_or_else(|err| panic!("template json: {err}"))
    }

    fn declares(template: &Value, section: &str, name: &str) -> bool {
        template
            .get(section)
            .and_then(|entries| entries.get(name))
            .is_some()
    }

    #[rstest]
    #[case(base_logical_ids::SUBNET)]
    #[case(base_logical_ids::SECURITY_GROUP)]
    #[case(base_logical_ids::DIRECTOR_IP)]
    #[case(base_logical_ids::DIRECTOR_USER)]
    #[case(base_logical_ids::NAT_INSTANCE)]
    #[case(base_logical_ids::NAT_IP)]
    #[case(base_logical_ids::VPC)]
    fn base_template_declares_required_resource(#[case] logical_id: &str) {
        assert!(declares(&parse(BASE_STACK_TEMPLATE), "Resources", logical_id));
    }

    #[rstest]
    #[case(application_logical_ids::SUBNET)]
    #[case(application_logical_ids::SECURITY_GROUP)]
    #[case(application_logical_ids::LOAD_BALANCER)]
    fn application_template_declares_required_resource(#[case] logical_id: &str) {
        assert!(declares(
            &parse(APPLICATION_STACK_TEMPLATE),
            "Resources",
            logical_id
        ));
    }

    #[rstest]
    #[case(BASE_STACK_TEMPLATE, base_parameters::NAT_INSTANCE_AMI)]
    #[case(BASE_STACK_TEMPLATE, base_parameters::KEY_NAME)]
    #[case(APPLICATION_STACK_TEMPLATE, application_parameters::VPC_ID)]
    #[case(APPLICATION_STACK_TEMPLATE, application_parameters::NAT_INSTANCE)]
    #[case(
        APPLICATION_STACK_TEMPLATE,
        application_parameters::PUBLICLY_ROUTABLE_SUBNET_ID
    )]
    #[case(APPLICATION_STACK_TEMPLATE, application_parameters::AVAILABILITY_ZONE)]
    fn templates_declare_supplied_parameters(#[case] template: &str, #[case] parameter: &str) {
        assert!(declares(&parse(template), "Parameters", parameter));
    }

    #[test]
    fn director_user_is_an_iam_user() {
        let template = parse(BASE_STACK_TEMPLATE);
        let kind = template
            .get("Resources")
            .and_then(|resources| resources.get(base_logical_ids::DIRECTOR_USER))
            .and_then(|user| user.get("Type"))
            .and_then(Value::as_str);
        assert_eq!(kind, Some("AWS::IAM::User"));
    }
}
