use groundwork_config::{ConfigDocument, FixedZones, SCHEMA_VERSION};
use indoc::indoc;
use rstest::rstest;

const FULL_0_0_1: &str = indoc! {r#"
    schema: 0.0.1
    name: groundwork-test
    region: us-west-2
    account_id: "123456789012"
    tags:
      team: platform
      cost-center: "4242"
    create_iam_roles_for_service_accounts: true
    network:
      create: true
      cidr: 10.0.0.0/16
      public_cidr_mask: 27
      private_cidr_mask: 19
      availability_zones: []
      max_azs: 3
      gateway_endpoints: true
      bastion:
        enabled: true
        instance_type: t3.micro
        ingress_cidrs: [203.0.113.0/24]
    storage:
      buckets:
        blobs:
          auto_delete_objects: true
          removal_policy_destroy: true
        logs:
          sse_kms_key_id: arn:aws:kms:us-west-2:123456789012:key/abc
    dns:
      zone_ids: [Z0522194BNY3VF7QK1DX]
    cluster:
      version: "1.27"
      private_api: true
      max_nodegroup_azs: 3
      global_node_labels:
        groundwork.io/platform-node: "true"
      global_node_tags: {}
      managed_nodegroups:
        compute:
          ssm_agent: true
          disk_size: 20
          min_size: 1
          max_size: 3
          instance_types: [t2.micro]
          availability_zones: [us-west-2a]
          spot: false
          desired_size: 1
      unmanaged_nodegroups:
        platform:
          gpu: false
          ssm_agent: true
          disk_size: 100
          min_size: 1
          max_size: 10
          instance_types: [m5.2xlarge]
          labels:
            groundwork.io/node-pool: platform
          tags:
            groundwork.io/node-pool: platform
    certificates:
      certificates:
      - domain: app.example.com
        zone_id: Z1
      - domain: '*.example.com'
        zone_id: Z2
    install:
      hostname: platform.example.com
      access_list: [0.0.0.0/0]
      registry_username: deployer
      overrides:
        replicaCounts:
          web: 3
"#};

fn zones() -> FixedZones {
    FixedZones::new(["us-west-2a", "us-west-2b", "us-west-2c", "us-west-2d"])
}

#[test]
fn full_document_loads() {
    let document = ConfigDocument::from_yaml(FULL_0_0_1, &zones()).unwrap();

    assert_eq!(document.schema, SCHEMA_VERSION);
    assert_eq!(document.name, "groundwork-test");
    assert!(document.create_iam_roles_for_service_accounts);
    assert!(document.network.bastion.as_ref().is_some_and(|b| b.enabled));
    assert_eq!(
        document.storage.as_ref().map(|s| s.buckets.len()),
        Some(2)
    );
    assert_eq!(
        document.certificates.as_ref().map(|c| c.certificates.len()),
        Some(2)
    );
    assert_eq!(
        document
            .install
            .as_ref()
            .and_then(|i| i.hostname.as_deref()),
        Some("platform.example.com")
    );
}

#[rstest]
#[case::with_comments(false)]
#[case::without_comments(true)]
fn full_document_round_trips(#[case] disable_comments: bool) {
    let provider = zones();
    let document = ConfigDocument::from_yaml(FULL_0_0_1, &provider).unwrap();

    let rendered = document.render(disable_comments).unwrap();
    let reloaded = ConfigDocument::from_yaml(&rendered, &provider).unwrap();

    assert_eq!(document, reloaded);
}

#[rstest]
#[case::with_comments(false)]
#[case::without_comments(true)]
fn template_round_trips_without_cloud_access(#[case] disable_comments: bool) {
    struct NoCloud;

    impl groundwork_config::ZoneProvider for NoCloud {
        fn availability_zones(
            &self,
            region: &str,
        ) -> Result<Vec<String>, groundwork_config::cloud::Error> {
            panic!("unexpected zone lookup for region {region}");
        }
    }

    let template = ConfigDocument::template();
    let rendered = template.render(disable_comments).unwrap();
    let reloaded = ConfigDocument::from_yaml(&rendered, &NoCloud).unwrap();

    assert_eq!(template, reloaded);
}

#[test]
fn oldest_schema_loads_identically_to_the_newest() {
    // The 0.0.0 shape: availability zones at the document root, the
    // unmanaged node group map under its old name, and no service-account
    // role flag.
    let old = indoc! {r#"
        schema: 0.0.0
        name: groundwork-test
        region: us-west-2
        account_id: "123456789012"
        availability_zones: [us-west-2a, us-west-2b]
        network:
          cidr: 10.0.0.0/16
        cluster:
          version: "1.27"
          nodegroups:
            platform:
              disk_size: 100
              min_size: 1
              max_size: 10
              instance_types: [m5.2xlarge]
    "#};
    let new = indoc! {r#"
        schema: 0.0.2
        name: groundwork-test
        region: us-west-2
        account_id: "123456789012"
        network:
          cidr: 10.0.0.0/16
          availability_zones: [us-west-2a, us-west-2b]
        cluster:
          version: "1.27"
          unmanaged_nodegroups:
            platform:
              disk_size: 100
              min_size: 1
              max_size: 10
              instance_types: [m5.2xlarge]
    "#};

    let provider = zones();
    let old = ConfigDocument::from_yaml(old, &provider).unwrap();
    let new = ConfigDocument::from_yaml(new, &provider).unwrap();
    assert_eq!(old, new);
}

#[test]
fn service_account_flag_is_dropped_from_0_0_0_documents() {
    let text = FULL_0_0_1.replace("schema: 0.0.1", "schema: 0.0.0");
    let document = ConfigDocument::from_yaml(&text, &zones()).unwrap();

    // 0.0.0 predates the flag, so even an explicit true loads as false.
    assert!(!document.create_iam_roles_for_service_accounts);
}
