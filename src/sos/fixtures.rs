//! Sample service documents used across the unit tests.

pub const CAPABILITIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sos:Capabilities version="1.0.0"
    xmlns:sos="http://www.opengis.net/sos/1.0"
    xmlns:ows="http://www.opengis.net/ows/1.1"
    xmlns:gml="http://www.opengis.net/gml"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <ows:ServiceIdentification>
    <ows:Title>Weather stations</ows:Title>
    <ows:Abstract>Air temperature and wind</ows:Abstract>
    <ows:ServiceType codeSpace="http://opengeospatial.net">OGC:SOS</ows:ServiceType>
  </ows:ServiceIdentification>
  <sos:Contents>
    <sos:ObservationOfferingList>
      <sos:ObservationOffering gml:id="temperature">
        <gml:name>Air temperature</gml:name>
        <sos:procedure xlink:href="urn:ogc:object:Sensor:station-1"/>
        <sos:observedProperty xlink:href="urn:ogc:def:property:OGC:1.0.30:air_temperature"/>
        <sos:featureOfInterest xlink:href="urn:ogc:object:feature:station-1"/>
        <sos:featureOfInterest xlink:href="urn:ogc:object:feature:station-2"/>
        <sos:responseFormat>text/xml;subtype="om/1.0.0"</sos:responseFormat>
      </sos:ObservationOffering>
      <sos:ObservationOffering gml:id="wind">
        <gml:name>Wind speed</gml:name>
        <sos:procedure xlink:href="urn:ogc:object:Sensor:station-2"/>
        <sos:featureOfInterest xlink:href="urn:ogc:object:feature:station-2"/>
        <sos:featureOfInterest xlink:href="urn:ogc:object:feature:station-3"/>
      </sos:ObservationOffering>
    </sos:ObservationOfferingList>
  </sos:Contents>
</sos:Capabilities>
"#;

pub const EMPTY_CAPABILITIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sos:Capabilities version="1.0.0" xmlns:sos="http://www.opengis.net/sos/1.0">
  <sos:Contents>
    <sos:ObservationOfferingList/>
  </sos:Contents>
</sos:Capabilities>
"#;

pub const EXCEPTION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport version="1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="request">
    <ows:ExceptionText>Unknown request type</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>
"#;

pub const FEATURES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gml:FeatureCollection
    xmlns:gml="http://www.opengis.net/gml"
    xmlns:sa="http://www.opengis.net/sampling/1.0"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <gml:featureMember>
    <sa:SamplingPoint gml:id="urn:ogc:object:feature:station-1">
      <gml:name>Station 1</gml:name>
      <sa:sampledFeature xlink:href=""/>
      <sa:position>
        <gml:Point>
          <gml:pos srsName="urn:ogc:def:crs:EPSG:4326">52.5 13.4</gml:pos>
        </gml:Point>
      </sa:position>
    </sa:SamplingPoint>
  </gml:featureMember>
  <gml:featureMember>
    <sa:SamplingPoint gml:id="urn:ogc:object:feature:station-2">
      <gml:name>Station 2</gml:name>
      <sa:position>
        <gml:Point>
          <gml:pos>7.1 50.7</gml:pos>
        </gml:Point>
      </sa:position>
    </sa:SamplingPoint>
  </gml:featureMember>
</gml:FeatureCollection>
"#;
